//! XML-RPC over HTTP 链路实现
//!
//! 每次调用是一个独立的 `POST`，由 `ureq` 的连接池复用 TCP 连接。

use crate::error::DriverError;
use crate::link::RemoteLink;
use onrobot_protocol::Value;
use onrobot_protocol::xmlrpc::{self, Response};
use std::time::Duration;
use tracing::trace;

/// 基于 HTTP 的 XML-RPC 链路
pub struct XmlRpcLink {
    agent: ureq::Agent,
    url: String,
}

impl XmlRpcLink {
    /// 创建链路（不会立即连接）
    ///
    /// # 参数
    ///
    /// - `url`: 完整端点，如 `http://192.168.1.1:41414/`
    /// - `timeout`: 单次请求的总超时
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for XmlRpcLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlRpcLink").field("url", &self.url).finish()
    }
}

impl RemoteLink for XmlRpcLink {
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, DriverError> {
        let body = xmlrpc::encode_call(method, args);
        trace!("XML-RPC call: {} ({} args)", method, args.len());

        let mut response = self
            .agent
            .post(&self.url)
            .header("Content-Type", "text/xml")
            .send(body.as_str())?;
        let text = response.body_mut().read_to_string()?;

        match xmlrpc::decode_response(&text)? {
            Response::Success(value) => Ok(value),
            Response::Fault { code, message } => {
                trace!("XML-RPC fault from {}: {} {}", method, code, message);
                Err(DriverError::Fault { code, message })
            }
        }
    }
}

impl From<ureq::Error> for DriverError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => DriverError::HttpStatus(code),
            ureq::Error::Timeout(_) => DriverError::Timeout,
            other => DriverError::Transport(other.to_string()),
        }
    }
}
