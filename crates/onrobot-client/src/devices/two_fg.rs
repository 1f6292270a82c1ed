//! 2FG7 / 2FG14 平行夹爪

use super::three_fg::GripDirection;
use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;

pub static TWO_FG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "2FG",
    identities: &[DeviceIdentity::TwoFg],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;
const GRIP_DETECT_POLLS: u32 = 20;

/// `move_to` 使用的固定夹持力（N）与速度（%）
const MOVE_FORCE: i64 = 100;
const MOVE_SPEED: i64 = 80;

/// 2FG 句柄
#[derive(Debug, Clone)]
pub struct TwoFg {
    handle: ActuatorHandle,
}

impl TwoFg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &TWO_FG_FAMILY, slot))
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

    /// 抓取
    ///
    /// # 参数
    ///
    /// - `width`: 目标宽度（mm），必须在当前方向的上下限内
    /// - `force`: 夹持力（N），20..=140
    /// - `speed`: 速度（%），10..=100
    ///
    /// # 错误
    ///
    /// 参数越界时返回 `InvalidParameter`，不会发出抓取命令。
    pub fn grip(
        &self,
        width: f64,
        force: i64,
        speed: i64,
        direction: GripDirection,
        wait: bool,
    ) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let (min, max) = self.width_limits(direction)?;
        self.handle.check_range("width", width, min, max)?;
        self.handle.check_range("force", force, 20, 140)?;
        self.handle.check_range("speed", speed, 10, 100)?;

        let method = match direction {
            GripDirection::Internal => "twofg_grip_internal",
            GripDirection::External => "twofg_grip_external",
        };
        self.handle.command(
            method,
            &[Value::Double(width), Value::Int(force), Value::Int(speed)],
        )?;

        let phases = vec![
            self.handle.busy_phase("twofg_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::GripDetected, GRIP_DETECT_POLLS, || {
                self.handle.read_bool("twofg_get_grip_detected")
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    pub fn grip_internal(&self, width: f64, force: i64, speed: i64, wait: bool) -> CommandResult<()> {
        self.grip(width, force, speed, GripDirection::Internal, wait)
    }

    pub fn grip_external(&self, width: f64, force: i64, speed: i64, wait: bool) -> CommandResult<()> {
        self.grip(width, force, speed, GripDirection::External, wait)
    }

    /// 以外抓方式移动到目标宽度，只确认忙碌清除
    pub fn move_to(&self, width: f64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let (min, max) = self.width_limits(GripDirection::External)?;
        self.handle.check_range("width", width, min, max)?;
        self.handle.command(
            "twofg_grip_external",
            &[
                Value::Double(width),
                Value::Int(MOVE_FORCE),
                Value::Int(MOVE_SPEED),
            ],
        )?;
        self.handle.confirm(
            "move",
            vec![self.handle.busy_phase("twofg_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("twofg_stop", &[])
    }

    fn width_limits(&self, direction: GripDirection) -> CommandResult<(f64, f64)> {
        let (min, max) = match direction {
            GripDirection::Internal => (
                "twofg_get_min_internal_width",
                "twofg_get_max_internal_width",
            ),
            GripDirection::External => (
                "twofg_get_min_external_width",
                "twofg_get_max_external_width",
            ),
        };
        Ok((self.handle.read_f64(min)?, self.handle.read_f64(max)?))
    }

    // ==================== 手指设置 ====================

    pub fn set_finger_length(&self, length: f64) -> CommandResult<()> {
        self.set_finger_setting("finger_length", "twofg_set_finger_length", length)
    }

    pub fn set_finger_height(&self, height: f64) -> CommandResult<()> {
        self.set_finger_setting("finger_height", "twofg_set_finger_height", height)
    }

    pub fn set_fingertip_offset(&self, offset: f64) -> CommandResult<()> {
        self.set_finger_setting("fingertip_offset", "twofg_set_fingertip_offset", offset)
    }

    /// 手指朝向：`true` 为朝外安装
    pub fn set_finger_orientation(&self, outward: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let orientation = if outward { 1.0 } else { 0.0 };
        self.handle
            .command("twofg_set_finger_orientation", &[Value::Double(orientation)])
    }

    fn set_finger_setting(&self, param: &'static str, method: &str, mm: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range(param, mm, 0.0, 100.0)?;
        self.handle.command(method, &[Value::Double(mm)])
    }

    // ==================== 状态 ====================

    fn read_f64(&self, method: &str) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64(method)
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("twofg_get_busy")
    }

    pub fn is_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("twofg_get_grip_detected")
    }

    pub fn status(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        self.handle.read_i64("twofg_get_status")
    }

    pub fn external_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_external_width")
    }

    pub fn internal_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_internal_width")
    }

    pub fn min_external_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_min_external_width")
    }

    pub fn max_external_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_max_external_width")
    }

    pub fn min_internal_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_min_internal_width")
    }

    pub fn max_internal_width(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_max_internal_width")
    }

    pub fn force(&self) -> CommandResult<f64> {
        self.read_f64("twofg_get_force")
    }

    pub fn finger_length(&self) -> CommandResult<f64> {
        self.read_f64("twofg_finger_length")
    }

    pub fn finger_height(&self) -> CommandResult<f64> {
        self.read_f64("twofg_finger_height")
    }

    pub fn fingertip_offset(&self) -> CommandResult<f64> {
        self.read_f64("twofg_fingertip_offset")
    }

    pub fn is_finger_outward(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("twofg_finger_orientation_outward")
    }
}
