//! 测试辅助：脚本化链路 + 虚拟时钟
//!
//! 所有场景都不需要真实控制器，轮询等待计入 `VirtualSleeper`。

#![allow(dead_code)]

use onrobot_client::{ActuatorHandle, FamilyDescriptor, VirtualSleeper};
use onrobot_driver::MockLink;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;
use std::time::Duration;

/// 一套测试环境
pub struct Rig {
    pub link: Arc<MockLink>,
    pub sleeper: Arc<VirtualSleeper>,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            link: Arc::new(MockLink::new()),
            sleeper: Arc::new(VirtualSleeper::new()),
        }
    }

    /// 只有给定设备在位（任何索引）
    pub fn with_device(identity: DeviceIdentity) -> Self {
        let rig = Self::new();
        rig.attach(identity);
        rig
    }

    pub fn attach(&self, identity: DeviceIdentity) {
        let code = identity.code();
        self.link.on("cb_is_device_connected", move |args| {
            Ok(Value::Bool(args.get(1) == Some(&Value::Int(code))))
        });
    }

    pub fn detach(&self) {
        self.link.returns("cb_is_device_connected", false);
    }

    pub fn handle(&self, family: &'static FamilyDescriptor, slot: ToolSlot) -> ActuatorHandle {
        ActuatorHandle::from_link(self.link.clone(), family, slot).with_sleeper(self.sleeper.clone())
    }

    pub fn elapsed(&self) -> Duration {
        self.sleeper.elapsed()
    }

    /// 调用过的方法名，不含连接检查
    pub fn commands(&self) -> Vec<String> {
        self.link
            .methods()
            .into_iter()
            .filter(|m| m != "cb_is_device_connected")
            .collect()
    }
}

/// 第 `k` 次调用起返回 `value`，之前返回 `!value`
pub fn bool_from(k: usize, value: bool) -> Vec<Value> {
    let mut values = vec![Value::Bool(!value); k.saturating_sub(1)];
    values.push(Value::Bool(value));
    values
}
