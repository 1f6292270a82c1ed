//! 3FG 三指夹爪
//!
//! 抓取确认分三个阶段：忙碌清除 → 抓取检测 → 力控抓取检测。
//! 直径范围随手指位置 / 长度变化，每次校验前都从设备读取当前上下限。

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;

pub static THREE_FG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "3FG",
    identities: &[DeviceIdentity::ThreeFg],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;
const GRIP_DETECT_POLLS: u32 = 20;
const FORCE_GRIP_DETECT_POLLS: u32 = 20;

/// 抓取方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripDirection {
    /// 从工件内侧向外撑开
    Internal,
    /// 从工件外侧向内夹紧
    External,
}

impl GripDirection {
    fn is_internal(self) -> bool {
        self == GripDirection::Internal
    }
}

/// 3FG 句柄
#[derive(Debug, Clone)]
pub struct ThreeFg {
    handle: ActuatorHandle,
}

impl ThreeFg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &THREE_FG_FAMILY, slot))
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

    // ==================== 动作 ====================

    /// 移动到目标直径（mm）
    pub fn move_to(&self, diameter: f64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.check_diameter(diameter)?;
        self.handle.command("tfg_move", &[Value::Double(diameter)])?;
        self.handle.confirm(
            "move",
            vec![self.handle.busy_phase("tfg_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    /// 普通抓取
    ///
    /// # 参数
    ///
    /// - `diameter`: 目标直径（mm），必须在设备当前上下限内
    /// - `force`: 夹持力（N），1..=100
    pub fn grip(
        &self,
        diameter: f64,
        force: f64,
        direction: GripDirection,
        wait: bool,
    ) -> CommandResult<()> {
        self.grip_with("tfg_grip", diameter, force, direction, wait)
    }

    /// 柔性抓取（手指可随工件形状顺应）
    pub fn flex_grip(
        &self,
        diameter: f64,
        force: f64,
        direction: GripDirection,
        wait: bool,
    ) -> CommandResult<()> {
        self.grip_with("tfg_flexible_grip", diameter, force, direction, wait)
    }

    pub fn grip_internal(&self, diameter: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.grip(diameter, force, GripDirection::Internal, wait)
    }

    pub fn grip_external(&self, diameter: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.grip(diameter, force, GripDirection::External, wait)
    }

    pub fn flex_grip_internal(&self, diameter: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.flex_grip(diameter, force, GripDirection::Internal, wait)
    }

    pub fn flex_grip_external(&self, diameter: f64, force: f64, wait: bool) -> CommandResult<()> {
        self.flex_grip(diameter, force, GripDirection::External, wait)
    }

    fn grip_with(
        &self,
        method: &str,
        diameter: f64,
        force: f64,
        direction: GripDirection,
        wait: bool,
    ) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.check_diameter(diameter)?;
        self.handle.check_range("force", force, 1.0, 100.0)?;

        self.handle.command(
            method,
            &[
                Value::Double(diameter),
                Value::Double(force),
                Value::Bool(direction.is_internal()),
            ],
        )?;

        let phases = vec![
            self.handle.busy_phase("tfg_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::GripDetected, GRIP_DETECT_POLLS, || {
                self.handle.read_bool("tfg_get_grip_detected")
            }),
            CommandPhase::new(PhaseKind::ForceGripDetected, FORCE_GRIP_DETECT_POLLS, || {
                self.handle.read_bool("tfg_get_force_grip_detected")
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    fn check_diameter(&self, diameter: f64) -> CommandResult<()> {
        let max = self.handle.read_f64("tfg_get_max_diameter")?;
        let min = self.handle.read_f64("tfg_get_min_diameter")?;
        self.handle.check_range("diameter", diameter, min, max)
    }

    // ==================== 设置 ====================

    /// 手指安装位置（1 / 2 / 3）
    pub fn set_finger_position(&self, position: i64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .check_one_of("finger_position", position, &[1, 2, 3])?;
        self.handle
            .command("tfg_set_finger_position", &[Value::Int(position)])
    }

    /// 手指长度（mm，0..=100）
    pub fn set_finger_length(&self, length: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("finger_length", length, 0.0, 100.0)?;
        self.handle
            .command("tfg_set_finger_length", &[Value::Double(length)])
    }

    /// 指尖偏移（mm，0..=100）
    pub fn set_fingertip_offset(&self, offset: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .check_range("fingertip_offset", offset, 0.0, 100.0)?;
        self.handle
            .command("tfg_set_fingertip_offset", &[Value::Double(offset)])
    }

    // ==================== 状态 ====================

    pub fn min_diameter(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_min_diameter")
    }

    pub fn max_diameter(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_max_diameter")
    }

    pub fn diameter(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_diameter")
    }

    /// 未经手指长度补偿的原始直径
    pub fn raw_diameter(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_diameter_raw")
    }

    pub fn force(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_force")
    }

    pub fn finger_position(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        self.handle.read_i64("tfg_get_finger_position")
    }

    pub fn finger_length(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("tfg_get_finger_length")
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("tfg_get_busy")
    }

    pub fn is_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("tfg_get_grip_detected")
    }

    pub fn is_force_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("tfg_get_force_grip_detected")
    }
}
