//! Mock 链路（测试用）
//!
//! 按方法名脚本化响应，并记录所有调用，用于在没有控制器的情况下
//! 验证设备句柄发出的调用序列。

use crate::error::DriverError;
use crate::link::RemoteLink;
use onrobot_protocol::Value;
use parking_lot::Mutex;
use std::collections::HashMap;

type Handler = Box<dyn FnMut(&[Value]) -> Result<Value, DriverError> + Send>;

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct MockState {
    handlers: HashMap<String, Handler>,
    calls: Vec<RecordedCall>,
}

/// 脚本化的内存链路
///
/// # Example
///
/// ```
/// use onrobot_driver::{MockLink, RemoteLink};
/// use onrobot_protocol::Value;
///
/// let link = MockLink::new();
/// link.returns("rg_get_busy", false);
/// link.sequence("rg_get_width", vec![Value::Double(10.0), Value::Double(20.0)]);
///
/// assert_eq!(link.call("rg_get_busy", &[Value::Int(0)]).unwrap(), Value::Bool(false));
/// assert_eq!(link.call("rg_get_width", &[]).unwrap(), Value::Double(10.0));
/// assert_eq!(link.call("rg_get_width", &[]).unwrap(), Value::Double(20.0));
/// // 序列耗尽后重复最后一个值
/// assert_eq!(link.call("rg_get_width", &[]).unwrap(), Value::Double(20.0));
/// assert_eq!(link.call_count("rg_get_width"), 3);
/// ```
#[derive(Default)]
pub struct MockLink {
    state: Mutex<MockState>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为方法注册任意处理函数（覆盖已有脚本）
    pub fn on<F>(&self, method: &str, handler: F)
    where
        F: FnMut(&[Value]) -> Result<Value, DriverError> + Send + 'static,
    {
        self.state
            .lock()
            .handlers
            .insert(method.to_string(), Box::new(handler));
    }

    /// 方法恒定返回同一个值
    pub fn returns(&self, method: &str, value: impl Into<Value>) {
        let value = value.into();
        self.on(method, move |_| Ok(value.clone()));
    }

    /// 方法依次返回给定值，耗尽后重复最后一个
    pub fn sequence(&self, method: &str, values: Vec<Value>) {
        let mut index = 0;
        self.on(method, move |_| {
            let value = values
                .get(index)
                .or_else(|| values.last())
                .cloned()
                .unwrap_or(Value::Nil);
            index += 1;
            Ok(value)
        });
    }

    /// 方法恒定返回错误
    pub fn fails(&self, method: &str, err: DriverError) {
        self.on(method, move |_| Err(err.clone()));
    }

    /// 全部调用记录（按发生顺序）
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// 某方法每次调用的参数
    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.args.clone())
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// 调用过的方法名（按顺序，含重复）
    pub fn methods(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|c| c.method.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl RemoteLink for MockLink {
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            method: method.to_string(),
            args: args.to_vec(),
        });
        match state.handlers.get_mut(method) {
            Some(handler) => handler(args),
            None => Err(DriverError::Fault {
                code: 1,
                message: format!("method {method} is not scripted"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscripted_method_faults() {
        let link = MockLink::new();
        let err = link.call("rg_grip", &[]).unwrap_err();
        assert!(matches!(err, DriverError::Fault { code: 1, .. }));
        // 失败的调用同样被记录
        assert_eq!(link.call_count("rg_grip"), 1);
    }

    #[test]
    fn test_handler_sees_arguments() {
        let link = MockLink::new();
        link.on("cb_is_device_connected", |args| {
            Ok(Value::Bool(args.get(1) == Some(&Value::Int(0xC0))))
        });
        assert_eq!(
            link.call("cb_is_device_connected", &[Value::Int(0), Value::Int(0xC0)])
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            link.call("cb_is_device_connected", &[Value::Int(0), Value::Int(0x20)])
                .unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            link.calls_to("cb_is_device_connected")[1],
            vec![Value::Int(0), Value::Int(0x20)]
        );
    }

    #[test]
    fn test_fails_and_clear() {
        let link = MockLink::new();
        link.fails("rg_get_busy", DriverError::Timeout);
        assert_eq!(link.call("rg_get_busy", &[]), Err(DriverError::Timeout));
        assert_eq!(link.methods(), vec!["rg_get_busy".to_string()]);
        link.clear_calls();
        assert!(link.calls().is_empty());
    }
}
