//! 设备会话
//!
//! `DeviceSession` 持有一份显式配置和一条惰性建立的远程链路。链路首次被
//! 使用时建立，并向控制器上报一次机器人类型。
//!
//! 建立失败时会话不会返回错误，而是持有一条不可用链路：之后所有调用都返回
//! `DriverError::LinkUnavailable`，由上层统一映射为「未连接」。要恢复只能
//! 重新创建会话。

use crate::config::SessionConfig;
use crate::error::DriverError;
use crate::http::XmlRpcLink;
use crate::link::{RemoteLink, UnusableLink};
use onrobot_protocol::Value;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

type LinkFactory =
    Box<dyn Fn(&SessionConfig) -> Result<Arc<dyn RemoteLink>, DriverError> + Send + Sync>;

struct ResolvedLink {
    link: Arc<dyn RemoteLink>,
    usable: bool,
}

/// 设备会话
pub struct DeviceSession {
    config: SessionConfig,
    factory: LinkFactory,
    resolved: OnceLock<ResolvedLink>,
}

impl DeviceSession {
    /// 使用 XML-RPC over HTTP 链路创建会话（不会立即连接）
    pub fn new(config: SessionConfig) -> Self {
        Self::with_factory(config, |config| {
            let link: Arc<dyn RemoteLink> =
                Arc::new(XmlRpcLink::new(config.endpoint(), config.request_timeout()));
            Ok(link)
        })
    }

    /// 使用现成的链路创建会话（测试、仿真或自定义传输）
    ///
    /// 机器人类型仍会在首次使用时上报。
    pub fn with_link(config: SessionConfig, link: Arc<dyn RemoteLink>) -> Self {
        Self::with_factory(config, move |_| Ok(Arc::clone(&link)))
    }

    /// 使用自定义链路工厂创建会话
    pub fn with_factory<F>(config: SessionConfig, factory: F) -> Self
    where
        F: Fn(&SessionConfig) -> Result<Arc<dyn RemoteLink>, DriverError> + Send + Sync + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            resolved: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 获取链路（首次调用时建立）
    pub fn link(&self) -> Arc<dyn RemoteLink> {
        Arc::clone(&self.resolve().link)
    }

    /// 链路是否可用（首次调用时建立）
    pub fn is_usable(&self) -> bool {
        self.resolve().usable
    }

    /// 立即建立链路
    ///
    /// # 错误
    ///
    /// 链路不可用时返回 `LinkUnavailable`。会话本身仍然可用，只是所有调用都会失败。
    pub fn connect(&self) -> Result<(), DriverError> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(DriverError::LinkUnavailable(self.config.endpoint()))
        }
    }

    fn resolve(&self) -> &ResolvedLink {
        self.resolved.get_or_init(|| self.establish())
    }

    fn establish(&self) -> ResolvedLink {
        let endpoint = self.config.endpoint();
        info!("Connecting to tooling controller at {}", endpoint);

        let link = match (self.factory)(&self.config) {
            Ok(link) => link,
            Err(e) => {
                warn!("Failed to create remote link to {}: {}", endpoint, e);
                return Self::unusable(e);
            }
        };

        match link.call(
            "cb_report_robot_type",
            &[Value::Int(self.config.robot_type)],
        ) {
            Ok(_) => {
                info!(
                    "Controller {} ready, robot type {} reported",
                    endpoint, self.config.robot_type
                );
                ResolvedLink { link, usable: true }
            }
            Err(e) if e.is_transport() || matches!(e, DriverError::LinkUnavailable(_)) => {
                warn!("Controller {} is unreachable: {}", endpoint, e);
                Self::unusable(e)
            }
            Err(e) => {
                // 控制器可达但拒绝了上报，链路仍可用
                warn!("Controller {} rejected robot type report: {}", endpoint, e);
                ResolvedLink { link, usable: true }
            }
        }
    }

    fn unusable(cause: DriverError) -> ResolvedLink {
        ResolvedLink {
            link: Arc::new(UnusableLink::new(cause.to_string())),
            usable: false,
        }
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("config", &self.config)
            .field("resolved", &self.resolved.get().map(|r| r.usable))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lazy_announcement_happens_once() {
        let mock = Arc::new(MockLink::new());
        mock.returns("cb_report_robot_type", Value::Int(0));
        mock.returns("rg_get_busy", false);

        let session = DeviceSession::with_link(SessionConfig::default(), mock.clone());
        // 未使用前不产生任何调用
        assert!(mock.calls().is_empty());

        let link = session.link();
        link.call("rg_get_busy", &[Value::Int(0)]).unwrap();
        session.link().call("rg_get_busy", &[Value::Int(0)]).unwrap();

        assert_eq!(mock.call_count("cb_report_robot_type"), 1);
        assert_eq!(
            mock.calls_to("cb_report_robot_type")[0],
            vec![Value::Int(8)]
        );
        assert!(session.is_usable());
        assert!(session.connect().is_ok());
    }

    #[test]
    fn test_unreachable_controller_fails_open() {
        let mock = Arc::new(MockLink::new());
        mock.fails(
            "cb_report_robot_type",
            DriverError::Transport("connection refused".into()),
        );
        mock.returns("rg_get_busy", false);

        let session = DeviceSession::with_link(SessionConfig::default(), mock.clone());
        assert!(!session.is_usable());
        assert!(matches!(
            session.connect(),
            Err(DriverError::LinkUnavailable(_))
        ));

        // 后续调用不会到达底层链路
        let err = session.link().call("rg_get_busy", &[]).unwrap_err();
        assert!(matches!(err, DriverError::LinkUnavailable(_)));
        assert_eq!(mock.call_count("rg_get_busy"), 0);
    }

    #[test]
    fn test_rejected_report_keeps_link() {
        let mock = Arc::new(MockLink::new());
        mock.fails(
            "cb_report_robot_type",
            DriverError::Fault {
                code: 1,
                message: "unsupported robot".into(),
            },
        );
        let session = DeviceSession::with_link(SessionConfig::default(), mock);
        assert!(session.is_usable());
    }

    #[test]
    fn test_factory_failure_and_single_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let session = DeviceSession::with_factory(SessionConfig::default(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DriverError::Transport("bad endpoint".into()))
        });
        assert!(!session.is_usable());
        assert!(!session.is_usable());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
