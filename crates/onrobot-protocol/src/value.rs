//! 远程调用值类型
//!
//! XML-RPC 的七种值在 Rust 侧统一为 [`Value`]。控制器固件对「布尔」的
//! 表达并不统一（有的返回 `boolean`，有的返回 `0/1` 整数），因此访问器在
//! 类型上做了有限的宽容转换，详见各方法说明。

use crate::ProtocolError;
use std::collections::BTreeMap;

/// 远程调用参数 / 返回值
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// `<int>` / `<i4>` / `<i8>`
    Int(i64),
    /// `<boolean>`
    Bool(bool),
    /// `<double>`
    Double(f64),
    /// `<string>`（或无类型标签的裸文本）
    String(String),
    /// `<array>`
    Array(Vec<Value>),
    /// `<struct>`，成员按名称排序
    Struct(BTreeMap<String, Value>),
    /// `<nil/>`
    Nil,
}

impl Value {
    /// 类型名（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Nil => "nil",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ProtocolError {
        ProtocolError::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
    }

    /// 读取整数
    ///
    /// `Bool` 按 `0/1` 处理。
    pub fn as_i64(&self) -> Result<i64, ProtocolError> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(other.mismatch("int")),
        }
    }

    /// 读取浮点数
    ///
    /// `Int` 会被提升为 `f64`（固件在数值恰好为整数时常返回 `<int>`）。
    pub fn as_f64(&self) -> Result<f64, ProtocolError> {
        match self {
            Value::Double(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(other.mismatch("double")),
        }
    }

    /// 读取布尔值
    ///
    /// 非零整数视为 `true`。
    pub fn as_bool(&self) -> Result<bool, ProtocolError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(v) => Ok(*v != 0),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_str(&self) -> Result<&str, ProtocolError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_array(&self) -> Result<&[Value], ProtocolError> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_struct(&self) -> Result<&BTreeMap<String, Value>, ProtocolError> {
        match self {
            Value::Struct(members) => Ok(members),
            other => Err(other.mismatch("struct")),
        }
    }

    /// 按名称取出 struct 成员
    ///
    /// # 错误
    ///
    /// - 不是 struct：`TypeMismatch`
    /// - 成员不存在：`MissingField`
    pub fn field(&self, name: &str) -> Result<&Value, ProtocolError> {
        self.as_struct()?
            .get(name)
            .ok_or_else(|| ProtocolError::MissingField(name.to_string()))
    }

    /// 读取定长浮点数组
    pub fn as_f64_array<const N: usize>(&self) -> Result<[f64; N], ProtocolError> {
        let items = self.as_array()?;
        if items.len() != N {
            return Err(ProtocolError::InvalidLength {
                expected: N,
                actual: items.len(),
            });
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64()?;
        }
        Ok(out)
    }

    /// 由 `(名称, 值)` 序列构建 struct
    pub fn structure<K, I>(members: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Struct(v)
    }
}
