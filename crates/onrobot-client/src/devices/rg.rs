//! RG2 / RG6 二指夹爪

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;

pub static RG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "RG",
    identities: &[DeviceIdentity::Rg2, DeviceIdentity::Rg6],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const MOVE_POLLS: u32 = 30;
const GRIP_DETECT_POLLS: u32 = 20;

/// 型号相关的运动范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgLimits {
    /// 开口宽度范围（mm）
    pub width: (f64, f64),
    /// 夹持力范围（N）
    pub force: (f64, f64),
}

impl RgLimits {
    pub const RG2: RgLimits = RgLimits {
        width: (0.0, 110.0),
        force: (3.0, 40.0),
    };
    pub const RG6: RgLimits = RgLimits {
        width: (0.0, 160.0),
        force: (25.0, 120.0),
    };

    pub fn for_identity(identity: Option<DeviceIdentity>) -> Self {
        match identity {
            Some(DeviceIdentity::Rg6) => Self::RG6,
            _ => Self::RG2,
        }
    }
}

/// RG2 / RG6 句柄
#[derive(Debug, Clone)]
pub struct Rg {
    handle: ActuatorHandle,
}

impl Rg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &RG_FAMILY, slot))
    }

    pub fn from_handle(handle: ActuatorHandle) -> Self {
        Self { handle }
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self::from_handle(self.handle.with_sleeper(sleeper))
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    pub fn is_rg2(&self) -> CommandResult<bool> {
        Ok(self.handle.ensure_connected()? == Some(DeviceIdentity::Rg2))
    }

    pub fn is_rg6(&self) -> CommandResult<bool> {
        Ok(self.handle.ensure_connected()? == Some(DeviceIdentity::Rg6))
    }

    /// 移动到目标宽度，不做抓取检测
    pub fn move_to(&self, width: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.start(width, force)?;
        self.handle
            .confirm("move", vec![self.handle.busy_phase("rg_get_busy", MOVE_POLLS)], wait)
    }

    /// 抓取：忙碌清除（30 次）后再确认抓取检测（20 次）
    pub fn grip(&self, width: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.start(width, force)?;
        let phases = vec![
            self.handle.busy_phase("rg_get_busy", MOVE_POLLS),
            CommandPhase::new(PhaseKind::GripDetected, GRIP_DETECT_POLLS, || {
                self.handle.read_bool("rg_get_grip_detected")
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    fn start(&self, width: f64, force: f64) -> CommandResult<()> {
        let identity = self.handle.ensure_connected()?;
        let limits = RgLimits::for_identity(identity);
        self.handle
            .check_range("width", width, limits.width.0, limits.width.1)?;
        self.handle
            .check_range("force", force, limits.force.0, limits.force.1)?;
        self.handle
            .command("rg_grip", &[Value::Double(width), Value::Double(force)])
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("rg_stop", &[])
    }

    pub fn speed(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("rg_get_speed")
    }

    /// 绝对深度（mm）
    pub fn depth(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("rg_get_depth")
    }

    /// 相对深度（mm）
    pub fn relative_depth(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("rg_get_relative_depth")
    }

    pub fn width(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("rg_get_width")
    }

    pub fn fingertip_offset(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("rg_get_fingertip_offset")
    }

    pub fn set_fingertip_offset(&self, offset: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .command("rg_set_fingertip_offset", &[Value::Double(offset)])
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("rg_get_busy")
    }

    pub fn is_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("rg_get_grip_detected")
    }

    /// 任一安全开关（S1 / S2）被触发
    pub fn is_safety_triggered(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        let s1 = self.handle.read_bool("rg_get_s1_triggered")?;
        let s2 = self.handle.read_bool("rg_get_s2_triggered")?;
        Ok(s1 || s2)
    }

    /// 重新给工具上电（安全开关触发后需要）
    pub fn reset_power(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.raw_call("cb_reset_tool_power", &[]).map(|_| ())
    }
}
