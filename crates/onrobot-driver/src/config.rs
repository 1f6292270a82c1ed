//! 会话配置
//!
//! 控制器地址等参数以显式配置值传递给 [`DeviceSession`](crate::DeviceSession)，
//! 可从 TOML 文件加载：
//!
//! ```toml
//! controller_ip = "192.168.1.1"
//! port = 41414
//! request_timeout_ms = 5000
//! ```

use crate::error::DriverError;
use onrobot_protocol::{DEFAULT_CONTROLLER_IP, DEFAULT_PORT, ROBOT_TYPE_DOOSAN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 控制器 IP 或主机名
    pub controller_ip: String,

    /// XML-RPC 服务端口
    pub port: u16,

    /// URL scheme（`http` / `https`）
    pub scheme: String,

    /// 单次远程调用的超时（毫秒）
    pub request_timeout_ms: u64,

    /// 建立链路后向控制器上报的机器人类型
    pub robot_type: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            controller_ip: DEFAULT_CONTROLLER_IP.to_string(),
            port: DEFAULT_PORT,
            scheme: "http".to_string(),
            request_timeout_ms: 5000,
            robot_type: ROBOT_TYPE_DOOSAN,
        }
    }
}

impl SessionConfig {
    /// 指定控制器地址，其余取默认值
    pub fn with_ip(ip: impl Into<String>) -> Self {
        Self {
            controller_ip: ip.into(),
            ..Self::default()
        }
    }

    /// XML-RPC 端点 URL
    pub fn endpoint(&self) -> String {
        format!("{}://{}:{}/", self.scheme, self.controller_ip, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 从 TOML 文本解析（缺省字段取默认值）
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    pub(crate) fn validate(&self) -> Result<(), DriverError> {
        if self.controller_ip.trim().is_empty() {
            return Err(DriverError::Config("controller_ip must not be empty".into()));
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(DriverError::Config(format!(
                "unsupported scheme {:?}",
                self.scheme
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(DriverError::Config(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}
