//! MG10 磁力夹爪

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub static MG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "MG",
    identities: &[DeviceIdentity::Mg],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;
/// 自动标定最长约 3 分钟
const CALIBRATION_POLLS: u32 = 1800;

/// `mg_set_finger_settings` 的指垫类型
const PAD_STANDARD: i64 = 1;
const PAD_CUSTOM: i64 = 3;
const PROTECTIVE_PAD_HEIGHT: f64 = 0.4;

/// MG 句柄
#[derive(Debug, Clone)]
pub struct Mg {
    handle: ActuatorHandle,
}

impl Mg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &MG_FAMILY, slot))
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

    /// 以给定磁力（%，1..=100）吸附
    pub fn grip(&self, strength: i64, wait: bool) -> CommandResult<()> {
        self.grip_with(strength, false, wait)
    }

    /// 智能吸附：先检测工件再启动磁铁
    ///
    /// # 错误
    ///
    /// 设备不支持智能吸附时返回 `Usage`，不发出命令。
    pub fn smart_grip(&self, strength: i64, wait: bool) -> CommandResult<()> {
        self.grip_with(strength, true, wait)
    }

    fn grip_with(&self, strength: i64, smart: bool, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        if smart && !self.handle.read_bool("mg_smart_grip_available")? {
            return Err(self.handle.fail(CommandError::Usage(
                "smart grip is unavailable on this device".to_string(),
            )));
        }
        self.handle.check_range("strength", strength, 1, 100)?;
        self.handle
            .command("mg_grip", &[Value::Int(strength), Value::Bool(smart)])?;

        let phases = vec![
            self.handle.busy_phase("mg_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::StrengthReached, 1, || {
                self.handle
                    .read_bool("mg_get_magnet_strength_not_reached")
                    .map(|not_reached| !not_reached)
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    /// 释放，确认磁力降到 0%
    pub fn release(&self, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.release_unchecked(wait)
    }

    fn release_unchecked(&self, wait: bool) -> CommandResult<()> {
        self.handle.command("mg_release", &[])?;
        let phases = vec![
            self.handle.busy_phase("mg_get_busy", BUSY_POLLS),
            CommandPhase::new(PhaseKind::StrengthReleased, 1, || {
                Ok(self.handle.read_f64("mg_get_magnet_strength_percent")? == 0.0)
            }),
        ];
        self.handle.confirm("release", phases, wait)
    }

    /// 自动标定
    ///
    /// 先释放，再启动标定并等待忙碌清除（最多 1800 次），最后再释放一次。
    /// 标定期间 9 mm 范围内不能有工件。
    ///
    /// 标定前的释放失败只记录告警，标定照常启动。
    pub fn auto_calibrate(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        if let Err(err) = self.release_unchecked(true) {
            warn!("MG release before calibration failed, continuing: {err}");
        }
        self.handle.command("mg_auto_calibrate", &[])?;
        self.handle.confirm(
            "auto calibration",
            vec![self.handle.busy_phase("mg_get_busy", CALIBRATION_POLLS)],
            true,
        )?;
        self.release_unchecked(true)?;
        info!("MG auto calibration finished on slot {}", self.handle.slot());
        Ok(())
    }

    // ==================== 指垫 ====================

    pub fn set_protective_pad(&self) -> CommandResult<()> {
        self.set_finger_settings(PAD_STANDARD, PROTECTIVE_PAD_HEIGHT)
    }

    pub fn set_no_pad(&self) -> CommandResult<()> {
        self.set_finger_settings(PAD_STANDARD, 0.0)
    }

    /// 自定义指垫高度（mm）
    pub fn set_custom_pad(&self, height: f64) -> CommandResult<()> {
        self.set_finger_settings(PAD_CUSTOM, height)
    }

    fn set_finger_settings(&self, pad_type: i64, height: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command(
            "mg_set_finger_settings",
            &[Value::Int(pad_type), Value::Double(height)],
        )
    }

    // ==================== 状态 ====================

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("mg_get_busy")
    }

    pub fn is_part_near(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("mg_part_near")
    }

    pub fn is_smart_grip_available(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("mg_smart_grip_available")
    }

    pub fn is_part_dropped(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("mg_get_part_dropped")
    }

    pub fn is_strength_not_reached(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("mg_get_magnet_strength_not_reached")
    }

    pub fn finger_type(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        let vars = self.handle.read_value("mg_get_all_variables")?;
        Ok(vars.field("finger_type")?.as_i64()?)
    }

    pub fn finger_height(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("mg_get_finger_height_mm")
    }

    pub fn strength_percent(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("mg_get_magnet_strength_percent")
    }

    pub fn error_code(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        self.handle.read_i64("mg_get_error_code")
    }
}
