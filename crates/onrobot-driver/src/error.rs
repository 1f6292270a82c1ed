//! 驱动层错误类型定义

use onrobot_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 区分两类失败：
/// - 传输失败（连接、超时、HTTP 状态、报文损坏）
/// - 控制器主动上报的 fault
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 传输层错误（连接被拒绝、DNS、TLS 等）
    #[error("Transport error: {0}")]
    Transport(String),

    /// 单次请求超时
    #[error("Operation timeout")]
    Timeout,

    /// 控制器返回非 2xx 状态码
    #[error("HTTP status {0} from controller")]
    HttpStatus(u16),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 控制器返回的 XML-RPC fault
    #[error("Remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// 会话未能建立可用链路
    ///
    /// 链路创建或机器人类型上报失败后，会话持有一个不可用链路，
    /// 其上的所有调用都返回此错误。
    #[error("Remote link unavailable: {0}")]
    LinkUnavailable(String),

    /// 配置加载 / 解析错误
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DriverError {
    /// 是否为传输类失败（与设备无关，重建链路可能恢复）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DriverError::Transport(_) | DriverError::Timeout | DriverError::HttpStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use onrobot_protocol::ProtocolError;

    /// 测试 DriverError 的 Display 实现
    #[test]
    fn test_driver_error_display() {
        let driver_error = DriverError::Transport("connection refused".to_string());
        let msg = format!("{}", driver_error);
        assert!(msg.contains("Transport") && msg.contains("connection refused"));

        let driver_error = DriverError::Timeout;
        assert_eq!(format!("{}", driver_error), "Operation timeout");

        let driver_error = DriverError::HttpStatus(502);
        assert_eq!(format!("{}", driver_error), "HTTP status 502 from controller");

        let driver_error = DriverError::Fault {
            code: 1,
            message: "unknown method".to_string(),
        };
        assert_eq!(format!("{}", driver_error), "Remote fault 1: unknown method");

        let driver_error = DriverError::LinkUnavailable("no route to host".to_string());
        assert!(format!("{}", driver_error).contains("unavailable"));
    }

    /// 测试 From<ProtocolError> 转换
    #[test]
    fn test_from_protocol_error() {
        let protocol_error = ProtocolError::MissingField("busy".to_string());
        let driver_error: DriverError = protocol_error.into();
        match driver_error {
            DriverError::Protocol(ProtocolError::MissingField(name)) => assert_eq!(name, "busy"),
            other => panic!("Expected Protocol variant, got {:?}", other),
        }
    }

    #[test]
    fn test_is_transport() {
        assert!(DriverError::Timeout.is_transport());
        assert!(DriverError::HttpStatus(500).is_transport());
        assert!(DriverError::Transport("x".into()).is_transport());
        assert!(!DriverError::LinkUnavailable("x".into()).is_transport());
        assert!(
            !DriverError::Fault {
                code: 1,
                message: String::new()
            }
            .is_transport()
        );
    }
}
