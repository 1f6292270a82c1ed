//! Builder 模式实现
//!
//! 提供链式构造 `DeviceSession` 实例的便捷方式。

use crate::config::SessionConfig;
use crate::error::DriverError;
use crate::link::RemoteLink;
use crate::session::DeviceSession;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Session Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use onrobot_driver::SessionBuilder;
/// use std::time::Duration;
///
/// let session = SessionBuilder::new()
///     .controller_ip("192.168.1.1")
///     .request_timeout(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    /// 基础配置（默认 `SessionConfig::default()`）
    base: Option<SessionConfig>,
    controller_ip: Option<String>,
    port: Option<u16>,
    scheme: Option<String>,
    request_timeout: Option<Duration>,
    robot_type: Option<i64>,
    /// 自定义链路（设置后不再创建 HTTP 链路）
    link: Option<Arc<dyn RemoteLink>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有配置为基础，后续 setter 覆盖其字段
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// 从 TOML 文件加载基础配置
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, DriverError> {
        self.base = Some(SessionConfig::load_from_file(path)?);
        Ok(self)
    }

    /// 设置控制器地址（默认 `192.168.1.1`）
    pub fn controller_ip(mut self, ip: impl Into<String>) -> Self {
        self.controller_ip = Some(ip.into());
        self
    }

    /// 设置端口（默认 41414）
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 使用 HTTPS
    pub fn https(mut self) -> Self {
        self.scheme = Some("https".to_string());
        self
    }

    /// 设置单次请求超时（默认 5s）
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// 设置上报的机器人类型（默认 8）
    pub fn robot_type(mut self, robot_type: i64) -> Self {
        self.robot_type = Some(robot_type);
        self
    }

    /// 使用自定义链路
    pub fn link(mut self, link: Arc<dyn RemoteLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// 构建最终配置（不创建会话）
    pub fn build_config(&self) -> Result<SessionConfig, DriverError> {
        let mut config = self.base.clone().unwrap_or_default();
        if let Some(ip) = &self.controller_ip {
            config.controller_ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(scheme) = &self.scheme {
            config.scheme = scheme.clone();
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout_ms = timeout.as_millis() as u64;
        }
        if let Some(robot_type) = self.robot_type {
            config.robot_type = robot_type;
        }
        config.validate()?;
        Ok(config)
    }

    /// 构建会话
    ///
    /// # 错误
    ///
    /// 配置非法时返回 `DriverError::Config`。链路本身在首次使用时才建立。
    pub fn build(self) -> Result<DeviceSession, DriverError> {
        let config = self.build_config()?;
        Ok(match self.link {
            Some(link) => DeviceSession::with_link(config, link),
            None => DeviceSession::new(config),
        })
    }
}
