//! XML-RPC 编解码
//!
//! 控制器只使用 XML-RPC 的一个很小的子集：标量、数组、struct、fault。
//! 这里直接手写编码器和一个基于 token 的递归下降解码器，不依赖 XML 库。
//!
//! ```text
//! encode_call("rg_grip", [0, 50.0, 20.0])
//!     ↓
//! <methodCall><methodName>rg_grip</methodName><params>...</params></methodCall>
//!     ↓ HTTP POST
//! <methodResponse><params><param><value>...</value></param></params></methodResponse>
//!     ↓
//! decode_response(..) -> Response::Success(Value)
//! ```

use crate::ProtocolError;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// 解码后的 `methodResponse`
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// 正常返回值（无返回值时为 `Value::Nil`）
    Success(Value),
    /// 控制器上报的 fault
    Fault { code: i64, message: String },
}

// ============================================================================
// 编码
// ============================================================================

/// 编码 `methodCall` 文档
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(128 + params.len() * 48);
    out.push_str("<?xml version=\"1.0\"?><methodCall><methodName>");
    escape_into(&mut out, method);
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// 编码 `methodResponse` 文档（测试桩服务端使用）
pub fn encode_response(response: &Response) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodResponse>");
    match response {
        Response::Success(value) => {
            out.push_str("<params><param>");
            encode_value(&mut out, value);
            out.push_str("</param></params>");
        }
        Response::Fault { code, message } => {
            out.push_str("<fault>");
            let fault = Value::structure([
                ("faultCode", Value::Int(*code)),
                ("faultString", Value::String(message.clone())),
            ]);
            encode_value(&mut out, &fault);
            out.push_str("</fault>");
        }
    }
    out.push_str("</methodResponse>");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(v) => {
            let tag = if i32::try_from(*v).is_ok() { "int" } else { "i8" };
            let _ = write!(out, "<{tag}>{v}</{tag}>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Double(v) => {
            let _ = write!(out, "<double>{v}</double>");
        }
        Value::String(s) => {
            out.push_str("<string>");
            escape_into(out, s);
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                escape_into(out, name);
                out.push_str("</name>");
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

// ============================================================================
// 解码
// ============================================================================

/// 解码 `methodResponse` 文档
///
/// # 错误
///
/// 文档结构不符合 XML-RPC 规范时返回 `ProtocolError::Malformed`，
/// 标量文本无法解析时返回 `ProtocolError::ParseError`。
pub fn decode_response(xml: &str) -> Result<Response, ProtocolError> {
    let mut p = Parser::new(tokenize(xml)?);
    p.expect_open("methodResponse")?;
    p.skip_ws();
    let response = match p.bump() {
        Some(Token::Open(tag)) if tag == "params" => {
            let value = if p.peek_is_open("param") {
                p.expect_open("param")?;
                let value = p.parse_value_element()?;
                p.expect_close("param")?;
                value
            } else {
                Value::Nil
            };
            p.expect_close("params")?;
            Response::Success(value)
        }
        Some(Token::Empty(tag)) if tag == "params" => Response::Success(Value::Nil),
        Some(Token::Open(tag)) if tag == "fault" => {
            let fault = p.parse_value_element()?;
            p.expect_close("fault")?;
            Response::Fault {
                code: fault.field("faultCode")?.as_i64()?,
                message: fault.field("faultString")?.as_str()?.to_string(),
            }
        }
        other => return Err(unexpected("<params> or <fault>", other)),
    };
    p.expect_close("methodResponse")?;
    p.expect_end()?;
    Ok(response)
}

/// 解码 `methodCall` 文档，返回方法名与参数
pub fn decode_call(xml: &str) -> Result<(String, Vec<Value>), ProtocolError> {
    let mut p = Parser::new(tokenize(xml)?);
    p.expect_open("methodCall")?;
    p.expect_open("methodName")?;
    let method = p.take_text().trim().to_string();
    p.expect_close("methodName")?;

    let mut params = Vec::new();
    p.skip_ws();
    match p.bump() {
        Some(Token::Open(tag)) if tag == "params" => loop {
            p.skip_ws();
            match p.bump() {
                Some(Token::Open(tag)) if tag == "param" => {
                    params.push(p.parse_value_element()?);
                    p.expect_close("param")?;
                }
                Some(Token::Close(tag)) if tag == "params" => break,
                other => return Err(unexpected("<param>", other)),
            }
        },
        Some(Token::Empty(tag)) if tag == "params" => {}
        Some(Token::Close(tag)) if tag == "methodCall" => {
            p.expect_end()?;
            return Ok((method, params));
        }
        other => return Err(unexpected("<params>", other)),
    }
    p.expect_close("methodCall")?;
    p.expect_end()?;
    Ok((method, params))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Empty(String),
    Text(String),
}

fn malformed(msg: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed(msg.into())
}

fn unexpected(expected: &str, found: Option<Token>) -> ProtocolError {
    match found {
        Some(token) => malformed(format!("expected {expected}, found {token:?}")),
        None => malformed(format!("expected {expected}, found end of document")),
    }
}

fn tokenize(xml: &str) -> Result<Vec<Token>, ProtocolError> {
    let mut tokens = Vec::new();
    let mut rest = xml;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<?") {
            let end = after
                .find("?>")
                .ok_or_else(|| malformed("unterminated processing instruction"))?;
            rest = &after[end + 2..];
        } else if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| malformed("unterminated comment"))?;
            rest = &after[end + 3..];
        } else if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after
                .find("]]>")
                .ok_or_else(|| malformed("unterminated CDATA section"))?;
            tokens.push(Token::Text(after[..end].to_string()));
            rest = &after[end + 3..];
        } else if let Some(after) = rest.strip_prefix("<!") {
            let end = after
                .find('>')
                .ok_or_else(|| malformed("unterminated declaration"))?;
            rest = &after[end + 1..];
        } else if let Some(after) = rest.strip_prefix('<') {
            let end = after.find('>').ok_or_else(|| malformed("unterminated tag"))?;
            let inner = &after[..end];
            rest = &after[end + 1..];
            if let Some(name) = inner.strip_prefix('/') {
                tokens.push(Token::Close(tag_name(name)?));
            } else if let Some(body) = inner.strip_suffix('/') {
                tokens.push(Token::Empty(tag_name(body)?));
            } else {
                tokens.push(Token::Open(tag_name(inner)?));
            }
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token::Text(unescape(&rest[..end])?));
            rest = &rest[end..];
        }
    }

    Ok(tokens)
}

fn tag_name(raw: &str) -> Result<String, ProtocolError> {
    match raw.split_whitespace().next() {
        Some(name) => Ok(name.to_string()),
        None => Err(malformed("empty tag name")),
    }
}

fn unescape(raw: &str) -> Result<String, ProtocolError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| malformed("unterminated entity reference"))?;
        let entity = &after[..semi];
        let ch = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) =
                    entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| malformed(format!("unknown entity &{entity};")))?
            }
        };
        out.push(ch);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn parse_scalar(kind: &str, text: String) -> Result<Value, ProtocolError> {
    match kind {
        "int" | "i4" | "i8" => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ProtocolError::ParseError { kind: "int", text }),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(ProtocolError::ParseError {
                kind: "boolean",
                text,
            }),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| ProtocolError::ParseError {
                kind: "double",
                text,
            }),
        "string" | "dateTime.iso8601" => Ok(Value::String(text)),
        other => Err(ProtocolError::UnsupportedType(other.to_string())),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_ws(&mut self) {
        while let Some(Token::Text(text)) = self.peek() {
            if !text.trim().is_empty() {
                break;
            }
            self.pos += 1;
        }
    }

    fn peek_is_open(&mut self, name: &str) -> bool {
        self.skip_ws();
        matches!(self.peek(), Some(Token::Open(tag)) if tag == name)
    }

    fn take_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(Token::Text(chunk)) = self.peek() {
            text.push_str(chunk);
            self.pos += 1;
        }
        text
    }

    fn expect_open(&mut self, name: &str) -> Result<(), ProtocolError> {
        self.skip_ws();
        match self.bump() {
            Some(Token::Open(tag)) if tag == name => Ok(()),
            other => Err(unexpected(&format!("<{name}>"), other)),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<(), ProtocolError> {
        self.skip_ws();
        match self.bump() {
            Some(Token::Close(tag)) if tag == name => Ok(()),
            other => Err(unexpected(&format!("</{name}>"), other)),
        }
    }

    fn expect_end(&mut self) -> Result<(), ProtocolError> {
        self.skip_ws();
        match self.bump() {
            None => Ok(()),
            other => Err(unexpected("end of document", other)),
        }
    }

    /// 解析完整的 `<value>...</value>`（允许 `<value/>`）
    fn parse_value_element(&mut self) -> Result<Value, ProtocolError> {
        self.skip_ws();
        match self.bump() {
            Some(Token::Open(tag)) if tag == "value" => self.parse_value_body(),
            Some(Token::Empty(tag)) if tag == "value" => Ok(Value::String(String::new())),
            other => Err(unexpected("<value>", other)),
        }
    }

    /// `<value>` 已被消费，解析内容直到 `</value>`
    fn parse_value_body(&mut self) -> Result<Value, ProtocolError> {
        let text = self.take_text();
        match self.bump() {
            // 无类型标签的裸文本按 string 处理
            Some(Token::Close(tag)) if tag == "value" => Ok(Value::String(text)),
            Some(Token::Open(kind)) if text.trim().is_empty() => {
                let value = self.parse_typed(&kind)?;
                self.expect_close("value")?;
                Ok(value)
            }
            Some(Token::Empty(kind)) if text.trim().is_empty() => {
                let value = match kind.as_str() {
                    "nil" => Value::Nil,
                    "string" => Value::String(String::new()),
                    "array" => Value::Array(Vec::new()),
                    "struct" => Value::Struct(BTreeMap::new()),
                    other => return Err(malformed(format!("empty <{other}/> element"))),
                };
                self.expect_close("value")?;
                Ok(value)
            }
            other => Err(unexpected("typed value or </value>", other)),
        }
    }

    fn parse_typed(&mut self, kind: &str) -> Result<Value, ProtocolError> {
        match kind {
            "array" => self.parse_array(),
            "struct" => self.parse_struct(),
            "nil" => {
                self.expect_close("nil")?;
                Ok(Value::Nil)
            }
            scalar => {
                let text = self.take_text();
                self.expect_close(scalar)?;
                parse_scalar(scalar, text)
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, ProtocolError> {
        self.skip_ws();
        let mut items = Vec::new();
        match self.bump() {
            Some(Token::Open(tag)) if tag == "data" => loop {
                self.skip_ws();
                match self.bump() {
                    Some(Token::Open(tag)) if tag == "value" => items.push(self.parse_value_body()?),
                    Some(Token::Empty(tag)) if tag == "value" => {
                        items.push(Value::String(String::new()))
                    }
                    Some(Token::Close(tag)) if tag == "data" => break,
                    other => return Err(unexpected("<value> or </data>", other)),
                }
            },
            Some(Token::Empty(tag)) if tag == "data" => {}
            other => return Err(unexpected("<data>", other)),
        }
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }

    fn parse_struct(&mut self) -> Result<Value, ProtocolError> {
        let mut members = BTreeMap::new();
        loop {
            self.skip_ws();
            match self.bump() {
                Some(Token::Open(tag)) if tag == "member" => {
                    self.expect_open("name")?;
                    let name = self.take_text().trim().to_string();
                    self.expect_close("name")?;
                    let value = self.parse_value_element()?;
                    self.expect_close("member")?;
                    members.insert(name, value);
                }
                Some(Token::Close(tag)) if tag == "struct" => break,
                other => return Err(unexpected("<member> or </struct>", other)),
            }
        }
        Ok(Value::Struct(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_call_layout() {
        let xml = encode_call(
            "twofg_grip_external",
            &[Value::Int(0), Value::Double(42.5), Value::Int(20), Value::Bool(true)],
        );
        assert!(xml.starts_with("<?xml version=\"1.0\"?><methodCall>"));
        assert!(xml.contains("<methodName>twofg_grip_external</methodName>"));
        assert!(xml.contains("<param><value><int>0</int></value></param>"));
        assert!(xml.contains("<value><double>42.5</double></value>"));
        assert!(xml.contains("<value><boolean>1</boolean></value>"));
        assert!(xml.ends_with("</params></methodCall>"));
    }

    #[test]
    fn test_encode_large_int_and_escape() {
        let xml = encode_call("m", &[Value::Int(1 << 40), Value::String("a<b&c".into())]);
        assert!(xml.contains("<i8>1099511627776</i8>"));
        assert!(xml.contains("<string>a&lt;b&amp;c</string>"));
    }

    #[test]
    fn test_decode_python_style_response() {
        // 控制器（Python xmlrpc 服务端）的典型输出，带换行
        let xml = "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n\
                   <value><boolean>1</boolean></value>\n</param>\n</params>\n</methodResponse>\n";
        assert_eq!(
            decode_response(xml).unwrap(),
            Response::Success(Value::Bool(true))
        );
    }

    #[test]
    fn test_decode_struct_response() {
        let xml = "<?xml version='1.0'?><methodResponse><params><param><value><struct>\n\
                   <member><name>busy</name><value><int>0</int></value></member>\n\
                   <member><name>ft</name><value><array><data>\n\
                   <value><double>1.5</double></value><value><double>-2.0</double></value>\n\
                   </data></array></value></member>\n\
                   <member><name>status</name><value><i4>3</i4></value></member>\n\
                   </struct></value></param></params></methodResponse>";
        let Response::Success(value) = decode_response(xml).unwrap() else {
            panic!("expected success");
        };
        assert!(!value.field("busy").unwrap().as_bool().unwrap());
        assert_eq!(value.field("status").unwrap().as_i64().unwrap(), 3);
        let ft = value.field("ft").unwrap().as_array().unwrap();
        assert_eq!(ft.len(), 2);
        assert_eq!(ft[1].as_f64().unwrap(), -2.0);
    }

    #[test]
    fn test_decode_fault() {
        let xml = "<?xml version='1.0'?><methodResponse><fault><value><struct>\
                   <member><name>faultCode</name><value><int>1</int></value></member>\
                   <member><name>faultString</name><value><string>&lt;class 'Exception'&gt;:unknown method</string></value></member>\
                   </struct></value></fault></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap(),
            Response::Fault {
                code: 1,
                message: "<class 'Exception'>:unknown method".to_string()
            }
        );
    }

    #[test]
    fn test_decode_bare_text_and_entities() {
        let xml = "<methodResponse><params><param><value>caf&#233; &#x41;&amp;B</value></param></params></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap(),
            Response::Success(Value::String("café A&B".to_string()))
        );
    }

    #[test]
    fn test_decode_nil_and_empty_params() {
        let xml = "<methodResponse><params><param><value><nil/></value></param></params></methodResponse>";
        assert_eq!(decode_response(xml).unwrap(), Response::Success(Value::Nil));

        let xml = "<methodResponse><params/></methodResponse>";
        assert_eq!(decode_response(xml).unwrap(), Response::Success(Value::Nil));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode_response("<methodResponse><params>"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_response("<html><body>502 Bad Gateway</body></html>"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_response(
                "<methodResponse><params><param><value><int>abc</int></value></param></params></methodResponse>"
            ),
            Err(ProtocolError::ParseError { kind: "int", .. })
        ));
        assert!(matches!(
            decode_response(
                "<methodResponse><params><param><value><base64>AA==</base64></value></param></params></methodResponse>"
            ),
            Err(ProtocolError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_call_survives_encode_decode() {
        let pose = Value::structure([
            ("x", Value::Double(120.25)),
            ("y", Value::Double(-3.0)),
            ("name", Value::String("pick & place".into())),
        ]);
        let args = vec![Value::Int(1), pose, Value::Array(vec![]), Value::Nil];
        let xml = encode_call("eye_run_process", &args);
        let (method, decoded) = decode_call(&xml).unwrap();
        assert_eq!(method, "eye_run_process");
        assert_eq!(decoded, args);
    }

    #[test]
    fn test_encode_response_fault() {
        let xml = encode_response(&Response::Fault {
            code: 7,
            message: "boom".into(),
        });
        assert_eq!(
            decode_response(&xml).unwrap(),
            Response::Fault {
                code: 7,
                message: "boom".into()
            }
        );
    }
}
