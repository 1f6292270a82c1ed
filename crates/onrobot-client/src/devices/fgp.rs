//! 2FGP20 码垛夹爪（平行夹爪 + 真空吸盘）

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;

pub static FGP_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "2FGP20",
    identities: &[DeviceIdentity::TwoFgp20],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;
const GRIP_DETECT_POLLS: u32 = 20;
/// 释放时使用的最小夹持力（N）
const RELEASE_FORCE: i64 = 80;
/// `fgp_get_vg_grip_status` 中表示已吸附的值
const VG_GRIPPED: i64 = 1;

/// 手指选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Fixed,
    Moving,
}

impl Finger {
    fn prefix(self) -> &'static str {
        match self {
            Finger::Fixed => "fixed",
            Finger::Moving => "moving",
        }
    }
}

/// 2FGP20 句柄
#[derive(Debug, Clone)]
pub struct Fgp {
    handle: ActuatorHandle,
}

impl Fgp {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &FGP_FAMILY, slot))
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

    // ==================== 夹爪 ====================

    /// 外抓
    ///
    /// # 参数
    ///
    /// - `force`: 80..=400 N
    /// - `speed`: 10..=100 %
    pub fn grip(&self, width: f64, force: i64, speed: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("force", force, 80, 400)?;
        self.handle.check_range("speed", speed, 10, 100)?;
        self.handle.command(
            "fgp_grip_external",
            &[Value::Double(width), Value::Int(force), Value::Int(speed)],
        )?;

        let phases = vec![
            self.handle.busy_phase("fgp_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::GripDetected, GRIP_DETECT_POLLS, || {
                self.handle.read_bool("fgp_get_fg_grip_detected")
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    /// 以最小夹持力张开到目标宽度
    pub fn release(&self, width: f64, speed: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("speed", speed, 10, 100)?;
        self.handle.command(
            "fgp_grip_external",
            &[
                Value::Double(width),
                Value::Int(RELEASE_FORCE),
                Value::Int(speed),
            ],
        )?;
        self.handle.confirm(
            "release",
            vec![self.handle.busy_phase("fgp_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("fgp_fg_stop", &[])
    }

    // ==================== 真空 ====================

    /// 真空吸附，真空度 5..=60 %
    pub fn vacuum_grip(&self, vacuum: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("vacuum", vacuum, 5, 60)?;
        // 第一个参数是固件保留的 required 标志
        self.handle
            .command("fgp_vg_grip", &[Value::Bool(true), Value::Int(vacuum)])?;

        let phases = vec![
            self.handle.busy_phase("fgp_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::VacuumGripped, GRIP_DETECT_POLLS, || {
                self.vg_gripped()
            }),
        ];
        self.handle.confirm("vacuum grip", phases, wait)
    }

    pub fn vacuum_release(&self, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("fgp_vg_release", &[])?;
        self.handle.confirm(
            "vacuum release",
            vec![self.handle.busy_phase("fgp_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    pub fn vacuum_level(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("fgp_get_vg_vacuum_percent")
    }

    /// 吸盘偏移（mm，0..=100）
    pub fn set_vacuum_offset(&self, offset: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("vacuum_offset", offset, 0.0, 100.0)?;
        self.handle
            .command("fgp_set_vg_vacuum_cups_offset", &[Value::Double(offset)])
    }

    pub fn vacuum_offset(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("fgp_get_vacuum_cups_offset")
    }

    pub fn is_vacuum_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.vg_gripped()
    }

    fn vg_gripped(&self) -> CommandResult<bool> {
        Ok(self.handle.read_i64("fgp_get_vg_grip_status")? == VG_GRIPPED)
    }

    // ==================== 手指几何 ====================

    /// 手指长度（mm，-300..=1000）
    pub fn set_finger_length(&self, finger: Finger, length: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("finger_length", length, -300.0, 1000.0)?;
        self.handle.command(
            &format!("fgp_set_{}_finger_length", finger.prefix()),
            &[Value::Double(length)],
        )
    }

    /// 手指高度（mm，0..=1000）
    pub fn set_finger_height(&self, finger: Finger, height: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("finger_height", height, 0.0, 1000.0)?;
        self.handle.command(
            &format!("fgp_set_{}_finger_height", finger.prefix()),
            &[Value::Double(height)],
        )
    }

    /// 指垫偏移（mm，1..=100）
    pub fn set_pad_offset(&self, finger: Finger, offset: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("pad_offset", offset, 1.0, 100.0)?;
        self.handle.command(
            &format!("fgp_set_{}_fingertip_offset", finger.prefix()),
            &[Value::Double(offset)],
        )
    }

    pub fn finger_length(&self, finger: Finger) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle
            .read_f64(&format!("fgp_get_{}_finger_length", finger.prefix()))
    }

    pub fn finger_height(&self, finger: Finger) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle
            .read_f64(&format!("fgp_get_{}_finger_height", finger.prefix()))
    }

    pub fn pad_offset(&self, finger: Finger) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle
            .read_f64(&format!("fgp_get_{}_fingertip_offset", finger.prefix()))
    }

    // ==================== 状态 ====================

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("fgp_get_busy")
    }

    pub fn is_gripped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("fgp_get_fg_grip_detected")
    }

    pub fn status(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        self.handle.read_i64("fgp_get_status")
    }

    pub fn width(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("fgp_get_external_width")
    }

    /// 最小外抓宽度（与 2FG 共用同一组远程方法）
    pub fn min_width(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("twofg_get_min_external_width")
    }

    pub fn max_width(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("twofg_get_max_external_width")
    }

    pub fn force(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("fgp_get_force")
    }

    /// 电机、电磁阀或编码器任一未标定
    pub fn has_error(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        for method in [
            "fgp_get_error_motor_not_calibrated",
            "fgp_get_error_solenoid_not_calibrated",
            "fgp_get_error_encoders_not_calibrated",
        ] {
            if self.handle.read_bool(method)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
