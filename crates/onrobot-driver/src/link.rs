//! 远程调用链路抽象
//!
//! `RemoteLink` 是设备句柄与传输实现之间的唯一接缝：
//!
//! ```text
//! ActuatorHandle (onrobot-client)
//!     ↓ call("rg_grip", [0, 50.0, 20.0])
//! RemoteLink (此 trait)
//!     ↓ XmlRpcLink / MockLink / UnusableLink
//! Compute Box
//! ```

use crate::error::DriverError;
use onrobot_protocol::Value;

/// 请求 / 响应式远程调用通道
///
/// 实现必须是 `Send + Sync`：同一链路会被多个设备句柄只读共享。
pub trait RemoteLink: Send + Sync {
    /// 发起一次同步远程调用
    ///
    /// # 参数
    ///
    /// - `method`: 远程方法名
    /// - `args`: 位置参数
    ///
    /// # 错误
    ///
    /// - 传输失败：`Transport` / `Timeout` / `HttpStatus`
    /// - 控制器上报错误：`Fault`
    /// - 响应无法解码：`Protocol`
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, DriverError>;
}

/// 类型化的调用便捷方法
pub trait RemoteLinkExt: RemoteLink {
    fn call_bool(&self, method: &str, args: &[Value]) -> Result<bool, DriverError> {
        Ok(self.call(method, args)?.as_bool()?)
    }

    fn call_i64(&self, method: &str, args: &[Value]) -> Result<i64, DriverError> {
        Ok(self.call(method, args)?.as_i64()?)
    }

    fn call_f64(&self, method: &str, args: &[Value]) -> Result<f64, DriverError> {
        Ok(self.call(method, args)?.as_f64()?)
    }

    /// 忽略返回值的调用（设置、停止类命令）
    fn call_unit(&self, method: &str, args: &[Value]) -> Result<(), DriverError> {
        self.call(method, args).map(|_| ())
    }
}

impl<T: RemoteLink + ?Sized> RemoteLinkExt for T {}

/// 不可用链路
///
/// 会话建立失败时的占位实现，所有调用都返回 `LinkUnavailable`。
#[derive(Debug, Clone)]
pub struct UnusableLink {
    reason: String,
}

impl UnusableLink {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl RemoteLink for UnusableLink {
    fn call(&self, _method: &str, _args: &[Value]) -> Result<Value, DriverError> {
        Err(DriverError::LinkUnavailable(self.reason.clone()))
    }
}
