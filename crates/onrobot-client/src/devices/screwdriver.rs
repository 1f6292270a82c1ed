//! SD 电动螺丝刀
//!
//! 每个动作只有一个忙碌阶段（螺杆或螺丝刀任一忙碌即为忙碌）。开启错误评估
//! 时（默认开启），动作结束后读取错误码与命令结果，解码为
//! [`ScrewdriverFault`]。

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

pub static SCREWDRIVER_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "SD",
    identities: &[DeviceIdentity::Screwdriver],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const TIGHTEN_POLLS: u32 = 300;
const LOOSEN_POLLS: u32 = 100;
const PICKUP_POLLS: u32 = 100;
const SHANK_POLLS: u32 = 30;

// ==================== 错误解码 ====================

const SAFETY_TRIGGERED: i64 = 0x04;
const NOT_CALIBRATED: i64 = 0x08;
const INIT_ERROR_MASK: i64 = 0xF0;
const WRONG_QUICK_CHANGER: i64 = 0x100;
const WRONG_POWER_SUPPLY: i64 = 0x200;

/// 初始化错误（错误码 0xF0 段）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    ShankStallCurrentNotReached,
    NoShankIndexMark,
    UnableToHomeShank,
    InvalidShankIndexPlacement,
    NoTorqueIndexMark,
    TorqueDifferenceOverflow,
    IndexMarkChanged,
}

impl InitError {
    fn from_code(code: i64) -> Option<Self> {
        match code & INIT_ERROR_MASK {
            0x10 => Some(Self::ShankStallCurrentNotReached),
            0x20 => Some(Self::NoShankIndexMark),
            0x30 => Some(Self::UnableToHomeShank),
            0x40 => Some(Self::InvalidShankIndexPlacement),
            0x50 => Some(Self::NoTorqueIndexMark),
            0x60 => Some(Self::TorqueDifferenceOverflow),
            0x70 => Some(Self::IndexMarkChanged),
            _ => None,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::ShankStallCurrentNotReached => "shank stall current not reached",
            Self::NoShankIndexMark => "no shank index mark found",
            Self::UnableToHomeShank => "unable to home shank",
            Self::InvalidShankIndexPlacement => "invalid shank index placement",
            Self::NoTorqueIndexMark => "no torque index mark found",
            Self::TorqueDifferenceOverflow => "torque difference overflow",
            Self::IndexMarkChanged => "index mark value has changed (clean encoder disk)",
        }
    }
}

/// 上一条命令的执行结果（`sd_get_command_results`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResultCode {
    UnknownCommand,
    NotScrewingIn,
    TorqueTimeout,
    TorqueExceededPrematurely,
    UnableToLoosen,
    ShankReachedEnd,
    ShankObstructed,
    Other(i64),
}

impl CommandResultCode {
    fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => return None,
            1 => Self::UnknownCommand,
            2 => Self::NotScrewingIn,
            3 => Self::TorqueTimeout,
            4 => Self::TorqueExceededPrematurely,
            5 => Self::UnableToLoosen,
            6 => Self::ShankReachedEnd,
            7 => Self::ShankObstructed,
            other => Self::Other(other),
        })
    }
}

impl fmt::Display for CommandResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::NotScrewingIn => write!(f, "not screwing in"),
            Self::TorqueTimeout => write!(f, "timeout waiting for torque"),
            Self::TorqueExceededPrematurely => write!(f, "torque exceeded prematurely"),
            Self::UnableToLoosen => write!(f, "unable to loosen screw"),
            Self::ShankReachedEnd => write!(f, "shank reached the end"),
            Self::ShankObstructed => write!(f, "shank obstructed during move"),
            Self::Other(code) => write!(f, "unknown command result {code}"),
        }
    }
}

/// 解码后的螺丝刀故障
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrewdriverFault {
    pub error_code: i64,
    pub safety_triggered: bool,
    pub not_calibrated: bool,
    pub init_error: Option<InitError>,
    pub wrong_quick_changer: bool,
    pub wrong_power_supply: bool,
    pub command_result: Option<CommandResultCode>,
}

impl ScrewdriverFault {
    /// 错误码与命令结果都为 0 时返回 `None`
    pub fn decode(error_code: i64, command_result: i64) -> Option<Self> {
        let command_result = CommandResultCode::from_code(command_result);
        if error_code == 0 && command_result.is_none() {
            return None;
        }
        Some(Self {
            error_code,
            safety_triggered: error_code & SAFETY_TRIGGERED != 0,
            not_calibrated: error_code & NOT_CALIBRATED != 0,
            init_error: InitError::from_code(error_code),
            wrong_quick_changer: error_code & WRONG_QUICK_CHANGER != 0,
            wrong_power_supply: error_code & WRONG_POWER_SUPPLY != 0,
            command_result,
        })
    }

    /// 面向操作员的提示，每项一条
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.safety_triggered {
            messages.push("safety circuit triggered".to_string());
        }
        if self.not_calibrated {
            messages.push("not calibrated".to_string());
        }
        if let Some(init) = self.init_error {
            messages.push(format!("init error: {}", init.message()));
        }
        if self.wrong_quick_changer {
            messages.push("wrong quick changer type".to_string());
        }
        if self.wrong_power_supply {
            messages.push("wrong power supply type".to_string());
        }
        if let Some(result) = self.command_result {
            messages.push(format!("command result: {result}"));
        }
        if messages.is_empty() {
            messages.push(format!("error code 0x{:X}", self.error_code));
        }
        messages
    }
}

impl fmt::Display for ScrewdriverFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

// ==================== 句柄 ====================

/// SD 句柄
#[derive(Debug, Clone)]
pub struct Screwdriver {
    handle: ActuatorHandle,
    evaluate_errors: Arc<Mutex<[bool; 3]>>,
}

impl Screwdriver {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &SCREWDRIVER_FAMILY, slot))
    }

    pub fn from_handle(handle: ActuatorHandle) -> Self {
        Self {
            handle,
            evaluate_errors: Arc::new(Mutex::new([true; 3])),
        }
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            handle: self.handle.with_sleeper(sleeper),
            evaluate_errors: self.evaluate_errors,
        }
    }

    /// 同一设备族、另一槽位的句柄，错误评估开关按槽位各自保存
    pub fn for_slot(&self, slot: ToolSlot) -> Self {
        Self {
            handle: self.handle.for_slot(slot),
            evaluate_errors: self.evaluate_errors.clone(),
        }
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    /// 开关动作结束后的错误评估
    pub fn set_error_evaluation(&self, enabled: bool) {
        self.evaluate_errors.lock()[self.slot_position()] = enabled;
    }

    pub fn error_evaluation(&self) -> bool {
        self.evaluate_errors.lock()[self.slot_position()]
    }

    fn slot_position(&self) -> usize {
        self.handle.slot().index() as usize
    }

    // ==================== 动作 ====================

    /// 拧紧
    ///
    /// # 参数
    ///
    /// - `force`: 18..=30 N
    /// - `screw_length`: 0..=35 mm
    /// - `torque`: 0..=5 Nm
    pub fn tighten(
        &self,
        force: i64,
        screw_length: f64,
        torque: f64,
        wait: bool,
    ) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.check_force_length(force, screw_length)?;
        self.handle.check_range("torque", torque, 0.0, 5.0)?;
        self.handle.command(
            "sd_tighten",
            &[
                Value::Int(force),
                Value::Double(screw_length),
                Value::Double(torque),
            ],
        )?;
        self.finish("tighten", TIGHTEN_POLLS, wait)
    }

    /// 松开
    pub fn loosen(&self, force: i64, screw_length: f64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.check_force_length(force, screw_length)?;
        self.handle.command(
            "sd_loosen",
            &[Value::Int(force), Value::Double(screw_length)],
        )?;
        self.finish("loosen", LOOSEN_POLLS, wait)
    }

    /// 取螺丝
    pub fn pickup_screw(&self, z_force: i64, screw_length: f64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.check_force_length(z_force, screw_length)?;
        self.handle.command(
            "sd_pickup_screw",
            &[Value::Int(z_force), Value::Double(screw_length)],
        )?;
        self.finish("pickup", PICKUP_POLLS, wait)
    }

    /// 螺杆移动到目标位置（mm，0..=55）
    pub fn move_shank(&self, position: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("shank_position", position, 0, 55)?;
        self.handle
            .command("sd_move_shank", &[Value::Int(position)])?;
        self.finish("move shank", SHANK_POLLS, wait)
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("sd_stop", &[])
    }

    /// 安全事件后重新给工具上电
    pub fn reset_power(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.raw_call("cb_reset_tool_power", &[]).map(|_| ())
    }

    fn check_force_length(&self, force: i64, screw_length: f64) -> CommandResult<()> {
        self.handle.check_range("force", force, 18, 30)?;
        self.handle
            .check_range("screw_length", screw_length, 0.0, 35.0)
    }

    /// 等待忙碌清除，再按需评估设备错误
    ///
    /// 设备故障优先于超时返回。
    fn finish(&self, operation: &str, max_polls: u32, wait: bool) -> CommandResult<()> {
        let busy = CommandPhase::new(PhaseKind::Busy, max_polls, || {
            self.read_busy().map(|busy| !busy)
        });
        let confirmed = self.handle.confirm(operation, vec![busy], wait);

        if self.error_evaluation() {
            if let Some(fault) = self.read_fault()? {
                if let Err(timeout) = &confirmed {
                    warn!("SD {} also failed with: {}", operation, timeout);
                }
                return Err(self
                    .handle
                    .fail(CommandError::device_fault(SCREWDRIVER_FAMILY.name, fault.to_string())));
            }
        }
        confirmed
    }

    // ==================== 状态 ====================

    /// 读取并解码当前错误码与命令结果
    pub fn fault(&self) -> CommandResult<Option<ScrewdriverFault>> {
        self.handle.ensure_connected()?;
        self.read_fault()
    }

    fn read_fault(&self) -> CommandResult<Option<ScrewdriverFault>> {
        let error_code = self.handle.read_i64("sd_get_error_code")?;
        let command_result = self.handle.read_i64("sd_get_command_results")?;
        Ok(ScrewdriverFault::decode(error_code, command_result))
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.read_busy()
    }

    fn read_busy(&self) -> CommandResult<bool> {
        let shank = self.handle.read_bool("sd_get_shank_busy")?;
        let device = self.handle.read_bool("sd_get_screwdriver_busy")?;
        Ok(shank || device)
    }

    pub fn torque_gradient(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("sd_get_torque_gradient")
    }

    pub fn shank_position(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("sd_get_shank_position")
    }

    pub fn force(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("sd_get_force")
    }

    pub fn achieved_torque(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("sd_get_achieved_torque")
    }

    pub fn current_torque(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("sd_get_current_torque")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fault_when_both_zero() {
        assert_eq!(ScrewdriverFault::decode(0, 0), None);
    }

    #[test]
    fn test_decode_error_bits() {
        let fault = ScrewdriverFault::decode(0x04 | 0x08 | 0x30 | 0x200, 0).unwrap();
        assert!(fault.safety_triggered);
        assert!(fault.not_calibrated);
        assert_eq!(fault.init_error, Some(InitError::UnableToHomeShank));
        assert!(!fault.wrong_quick_changer);
        assert!(fault.wrong_power_supply);
        assert_eq!(fault.command_result, None);
        assert_eq!(
            fault.to_string(),
            "safety circuit triggered; not calibrated; init error: unable to home shank; \
             wrong power supply type"
        );
    }

    #[test]
    fn test_decode_command_result_only() {
        let fault = ScrewdriverFault::decode(0, 4).unwrap();
        assert_eq!(
            fault.command_result,
            Some(CommandResultCode::TorqueExceededPrematurely)
        );
        assert_eq!(fault.to_string(), "command result: torque exceeded prematurely");

        let unknown = ScrewdriverFault::decode(0, 42).unwrap();
        assert_eq!(unknown.command_result, Some(CommandResultCode::Other(42)));
    }

    #[test]
    fn test_unmapped_error_bits_still_reported() {
        let fault = ScrewdriverFault::decode(0x01, 0).unwrap();
        assert_eq!(fault.messages(), vec!["error code 0x1".to_string()]);
    }
}
