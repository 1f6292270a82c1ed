//! 通用设备句柄
//!
//! 所有设备族共用一个 [`ActuatorHandle`]，差异由静态的
//! [`FamilyDescriptor`] 描述（可接受的设备标识、寻址方式、名称）。
//! 各设备族模块只负责参数范围、阶段构造和超时补偿。
//!
//! 每个公开操作的固定顺序：
//!
//! 1. 连接检查（每次都检查，不缓存）
//! 2. 参数校验（越界直接返回，不发出任何启动命令）
//! 3. 启动命令
//! 4. 确认阶段

use crate::engine::{CommandPhase, ConfirmationEngine, Sleeper, ThreadSleeper};
use crate::error::{CommandError, CommandResult};
use onrobot_driver::{DeviceSession, DriverError, RemoteLink};
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 设备在远程调用中的寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// 按工具槽位寻址，所有设备调用的第一个参数是槽位索引
    PerSlot,
    /// 固定索引；`in_calls` 为 `false` 时索引只用于连接检查
    Fixed { index: i64, in_calls: bool },
    /// 控制器级功能，无索引
    Controller,
}

/// 连接检查方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// `cb_is_device_connected(index, id)`，任一标识命中即视为已连接
    Device,
    /// 调用无参数的布尔方法
    Method(&'static str),
    /// 无需检查
    Always,
}

/// 设备族描述符
#[derive(Debug)]
pub struct FamilyDescriptor {
    /// 日志与错误信息中使用的名称
    pub name: &'static str,
    /// 可接受的设备标识（按检查顺序）
    pub identities: &'static [DeviceIdentity],
    pub addressing: Addressing,
    pub presence: Presence,
}

/// 通用设备句柄
#[derive(Clone)]
pub struct ActuatorHandle {
    link: Arc<dyn RemoteLink>,
    family: &'static FamilyDescriptor,
    slot: ToolSlot,
    engine: ConfirmationEngine,
}

impl fmt::Debug for ActuatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorHandle")
            .field("family", &self.family.name)
            .field("slot", &self.slot)
            .finish()
    }
}

impl ActuatorHandle {
    /// 创建绑定到槽位的句柄
    ///
    /// 非 `PerSlot` 设备族忽略 `slot`。
    pub fn new(session: &DeviceSession, family: &'static FamilyDescriptor, slot: ToolSlot) -> Self {
        Self::from_link(session.link(), family, slot)
    }

    /// 直接使用链路创建句柄
    pub fn from_link(
        link: Arc<dyn RemoteLink>,
        family: &'static FamilyDescriptor,
        slot: ToolSlot,
    ) -> Self {
        Self {
            link,
            family,
            slot,
            engine: ConfirmationEngine::new(Arc::new(ThreadSleeper)),
        }
    }

    /// 替换轮询睡眠实现（仿真 / 测试）
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.engine = ConfirmationEngine::new(sleeper);
        self
    }

    /// 同一链路与引擎、绑定到另一槽位的句柄
    pub fn for_slot(&self, slot: ToolSlot) -> Self {
        Self {
            slot,
            ..self.clone()
        }
    }

    pub fn family(&self) -> &'static FamilyDescriptor {
        self.family
    }

    pub fn slot(&self) -> ToolSlot {
        self.slot
    }

    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    /// 远程调用使用的设备索引
    pub fn index(&self) -> i64 {
        match self.family.addressing {
            Addressing::PerSlot => self.slot.index(),
            Addressing::Fixed { index, .. } => index,
            Addressing::Controller => 0,
        }
    }

    fn location(&self) -> String {
        match self.family.addressing {
            Addressing::PerSlot => format!("slot {}", self.slot),
            Addressing::Fixed { index, .. } => format!("index {}", index),
            Addressing::Controller => "controller".to_string(),
        }
    }

    // ==================== 前置检查 ====================

    /// 检查设备是否已连接，返回命中的设备标识
    ///
    /// 对 `Presence::Method` / `Presence::Always` 设备族返回描述符中的第一个标识
    /// （没有时返回 `None`）。
    ///
    /// # 错误
    ///
    /// - 设备不在位或会话链路不可用：`NotConnected`
    /// - 其他链路错误：`Transport`
    pub fn ensure_connected(&self) -> CommandResult<Option<DeviceIdentity>> {
        let connected = match self.family.presence {
            Presence::Always => return Ok(self.family.identities.first().copied()),
            Presence::Method(method) => self
                .raw_call(method, &[])?
                .as_bool()?
                .then(|| self.family.identities.first().copied()),
            Presence::Device => {
                let mut found = None;
                for identity in self.family.identities {
                    let present = self
                        .raw_call(
                            "cb_is_device_connected",
                            &[Value::Int(self.index()), Value::Int(identity.code())],
                        )?
                        .as_bool()?;
                    if present {
                        found = Some(Some(*identity));
                        break;
                    }
                }
                found
            }
        };

        match connected {
            Some(identity) => Ok(identity),
            None => Err(self.fail(CommandError::NotConnected {
                family: self.family.name,
                location: self.location(),
            })),
        }
    }

    /// 闭区间范围校验
    pub fn check_range<T>(&self, param: &'static str, value: T, min: T, max: T) -> CommandResult<()>
    where
        T: PartialOrd + fmt::Display + Copy,
    {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(self.fail(CommandError::invalid_parameter(
                param,
                value,
                format!("{}..={}", min, max),
            )))
        }
    }

    /// 取值集合校验
    pub fn check_one_of<T>(&self, param: &'static str, value: T, allowed: &[T]) -> CommandResult<()>
    where
        T: PartialEq + fmt::Display + fmt::Debug,
    {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(self.fail(CommandError::invalid_parameter(
                param,
                value,
                format!("one of {:?}", allowed),
            )))
        }
    }

    /// 记录错误并原样返回
    pub fn fail(&self, err: CommandError) -> CommandError {
        warn!("{} ({}): {}", self.family.name, self.location(), err);
        err
    }

    // ==================== 远程调用 ====================

    /// 原样发起调用（不附加设备索引）
    pub fn raw_call(&self, method: &str, args: &[Value]) -> CommandResult<Value> {
        debug!("{} -> {}{:?}", self.family.name, method, args);
        self.link.call(method, args).map_err(|e| self.map_driver_error(e))
    }

    /// 设备调用：按寻址方式在参数前附加设备索引
    pub fn call(&self, method: &str, args: &[Value]) -> CommandResult<Value> {
        let with_index = match self.family.addressing {
            Addressing::PerSlot | Addressing::Fixed { in_calls: true, .. } => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(Value::Int(self.index()));
                full.extend_from_slice(args);
                full
            }
            Addressing::Fixed { in_calls: false, .. } | Addressing::Controller => args.to_vec(),
        };
        self.raw_call(method, &with_index)
    }

    /// 忽略返回值的设备调用
    pub fn command(&self, method: &str, args: &[Value]) -> CommandResult<()> {
        self.call(method, args).map(|_| ())
    }

    pub fn read_bool(&self, method: &str) -> CommandResult<bool> {
        Ok(self.call(method, &[])?.as_bool()?)
    }

    pub fn read_f64(&self, method: &str) -> CommandResult<f64> {
        Ok(self.call(method, &[])?.as_f64()?)
    }

    pub fn read_i64(&self, method: &str) -> CommandResult<i64> {
        Ok(self.call(method, &[])?.as_i64()?)
    }

    pub fn read_value(&self, method: &str) -> CommandResult<Value> {
        self.call(method, &[])
    }

    fn map_driver_error(&self, err: DriverError) -> CommandError {
        match err {
            DriverError::LinkUnavailable(reason) => CommandError::NotConnected {
                family: self.family.name,
                location: format!("{}, link unavailable: {}", self.location(), reason),
            },
            other => CommandError::Transport(other),
        }
    }

    // ==================== 确认 ====================

    /// 执行确认阶段，超时转换为 `TimedOut` 错误
    pub fn confirm(&self, operation: &str, phases: Vec<CommandPhase<'_>>, wait: bool) -> CommandResult<()> {
        let confirmation = self.engine.confirm(phases, wait)?;
        match confirmation.outcome {
            crate::engine::CommandOutcome::TimedOut(phase) => {
                warn!("{} {} timed out in {}", self.family.name, operation, phase);
                Err(CommandError::TimedOut {
                    family: self.family.name,
                    phase,
                })
            }
            _ => {
                debug!(
                    "{} {} confirmed after {} polls",
                    self.family.name, operation, confirmation.polls
                );
                Ok(())
            }
        }
    }

    /// 「忙碌清除」单阶段
    pub fn busy_phase(&self, busy_method: &'static str, max_polls: u32) -> CommandPhase<'_> {
        CommandPhase::new(crate::engine::PhaseKind::Busy, max_polls, move || {
            self.read_bool(busy_method).map(|busy| !busy)
        })
    }

    /// 固定时长等待
    pub fn settle(&self, duration: Duration) {
        self.engine.settle(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PhaseId, PhaseKind, VirtualSleeper};
    use onrobot_driver::MockLink;

    static TEST_FAMILY: FamilyDescriptor = FamilyDescriptor {
        name: "TEST",
        identities: &[DeviceIdentity::Rg2, DeviceIdentity::Rg6],
        addressing: Addressing::PerSlot,
        presence: Presence::Device,
    };

    static FIXED_FAMILY: FamilyDescriptor = FamilyDescriptor {
        name: "FIXED",
        identities: &[DeviceIdentity::HexV3],
        addressing: Addressing::Fixed {
            index: -1,
            in_calls: false,
        },
        presence: Presence::Device,
    };

    fn handle(mock: &Arc<MockLink>, family: &'static FamilyDescriptor) -> ActuatorHandle {
        ActuatorHandle::from_link(mock.clone(), family, ToolSlot::DualSecondary)
            .with_sleeper(Arc::new(VirtualSleeper::new()))
    }

    #[test]
    fn test_presence_tries_every_identity() {
        let mock = Arc::new(MockLink::new());
        mock.on("cb_is_device_connected", |args| {
            Ok(Value::Bool(args[1] == Value::Int(0x21)))
        });
        let h = handle(&mock, &TEST_FAMILY);
        assert_eq!(h.ensure_connected().unwrap(), Some(DeviceIdentity::Rg6));
        assert_eq!(
            mock.calls_to("cb_is_device_connected"),
            vec![
                vec![Value::Int(2), Value::Int(0x20)],
                vec![Value::Int(2), Value::Int(0x21)],
            ]
        );
    }

    #[test]
    fn test_absent_device_is_not_connected() {
        let mock = Arc::new(MockLink::new());
        mock.returns("cb_is_device_connected", false);
        let h = handle(&mock, &TEST_FAMILY);
        let err = h.ensure_connected().unwrap_err();
        assert!(matches!(err, CommandError::NotConnected { family: "TEST", .. }));
        assert!(err.to_string().contains("dual-secondary"));
    }

    #[test]
    fn test_unusable_link_is_not_connected() {
        let link: Arc<dyn RemoteLink> = Arc::new(onrobot_driver::UnusableLink::new("refused"));
        let h = ActuatorHandle::from_link(link, &TEST_FAMILY, ToolSlot::Single);
        assert!(matches!(
            h.ensure_connected(),
            Err(CommandError::NotConnected { .. })
        ));
    }

    #[test]
    fn test_fixed_index_addressing() {
        let mock = Arc::new(MockLink::new());
        mock.returns("cb_is_device_connected", true);
        mock.returns("hex_get_all_variables", Value::Nil);
        let h = handle(&mock, &FIXED_FAMILY);
        h.ensure_connected().unwrap();
        h.read_value("hex_get_all_variables").unwrap();
        assert_eq!(
            mock.calls_to("cb_is_device_connected")[0],
            vec![Value::Int(-1), Value::Int(0x40)]
        );
        assert!(mock.calls_to("hex_get_all_variables")[0].is_empty());
    }

    #[test]
    fn test_slot_index_prepended() {
        let mock = Arc::new(MockLink::new());
        mock.returns("rg_grip", Value::Nil);
        let h = handle(&mock, &TEST_FAMILY);
        h.command("rg_grip", &[Value::Double(50.0), Value::Double(20.0)])
            .unwrap();
        assert_eq!(
            mock.calls_to("rg_grip")[0],
            vec![Value::Int(2), Value::Double(50.0), Value::Double(20.0)]
        );
    }

    #[test]
    fn test_range_checks() {
        let mock = Arc::new(MockLink::new());
        let h = handle(&mock, &TEST_FAMILY);
        assert!(h.check_range("force", 20.0, 20.0, 140.0).is_ok());
        assert!(h.check_range("force", 140.0, 20.0, 140.0).is_ok());
        let err = h.check_range("force", 19.9, 20.0, 140.0).unwrap_err();
        assert_eq!(
            err,
            CommandError::invalid_parameter("force", 19.9, "20..=140")
        );
        assert!(h.check_one_of("finger_position", 2, &[1, 2, 3]).is_ok());
        assert!(h.check_one_of("finger_position", 4, &[1, 2, 3]).is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_confirm_maps_timeout() {
        let mock = Arc::new(MockLink::new());
        mock.returns("rg_get_busy", true);
        let h = handle(&mock, &TEST_FAMILY);
        let err = h
            .confirm("move", vec![h.busy_phase("rg_get_busy", 30)], true)
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::TimedOut {
                family: "TEST",
                phase: PhaseId::new(0, PhaseKind::Busy)
            }
        );
        assert_eq!(mock.call_count("rg_get_busy"), 30);
    }
}
