//! Sander 打磨头
//!
//! 固定索引 0。连接检查额外要求外部电源告警位（0x20）为 0。

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, SANDER_INDEX, ToolSlot, Value};
use std::sync::Arc;

pub static SANDER_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "Sander",
    identities: &[DeviceIdentity::Sander],
    addressing: Addressing::Fixed {
        index: SANDER_INDEX,
        in_calls: true,
    },
    presence: Presence::Device,
};

/// 外部电源未连接告警位
pub const POWER_SUPPLY_WARNING: i64 = 0x20;
/// 低于该转速视为停止命令
pub const MIN_RUNNING_RPM: i64 = 1000;
pub const MAX_RPM: i64 = 10000;

const START_POLLS: u32 = 30;
const SETTLE_POLLS: u32 = 30;
const STOP_POLLS: u32 = 20;

/// Sander 句柄
#[derive(Debug, Clone)]
pub struct Sander {
    handle: ActuatorHandle,
}

impl Sander {
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &SANDER_FAMILY,
            ToolSlot::default(),
        ))
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

    /// 设备在位且外部电源已连接
    pub fn ensure_ready(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let warning = self.handle.read_i64("sdr_get_warning")?;
        if warning & POWER_SUPPLY_WARNING != 0 {
            return Err(self.handle.fail(CommandError::NotConnected {
                family: SANDER_FAMILY.name,
                location: "external power supply is not connected".to_string(),
            }));
        }
        Ok(())
    }

    /// 设置转速
    ///
    /// - `rpm >= 1000`：启动，依次确认电机运行（30 次）和转速稳定（30 次，
    ///   既不在加速也不在减速）
    /// - `rpm < 1000`：停止，确认电机停止（20 次）
    ///
    /// # 错误
    ///
    /// `rpm` 超出 0..=10000 时返回 `InvalidParameter`。
    pub fn set_rpm(&self, rpm: i64, wait: bool) -> CommandResult<()> {
        self.ensure_ready()?;
        self.handle.check_range("rpm", rpm, 0, MAX_RPM)?;

        if rpm >= MIN_RUNNING_RPM {
            self.handle.command("sdr_start", &[Value::Int(rpm)])?;
            let phases = vec![
                CommandPhase::new(PhaseKind::MotorRunning, START_POLLS, || {
                    self.handle.read_bool("sdr_get_motor_running")
                }),
                // 两个加减速标志都清零才算转速稳定；任一仍为真则继续轮询
                CommandPhase::new(PhaseKind::SpeedSettled, SETTLE_POLLS, || {
                    let ramping_up = self.handle.read_bool("sdr_get_motor_ramping_up")?;
                    let ramping_down = self.handle.read_bool("sdr_get_motor_ramping_down")?;
                    Ok(!ramping_up && !ramping_down)
                }),
            ];
            self.handle.confirm("start", phases, wait)
        } else {
            self.handle.command("sdr_stop", &[])?;
            let stopped = CommandPhase::new(PhaseKind::MotorStopped, STOP_POLLS, || {
                self.handle.read_bool("sdr_get_motor_stopped")
            });
            self.handle.confirm("stop", vec![stopped], wait)
        }
    }

    pub fn stop(&self, wait: bool) -> CommandResult<()> {
        self.set_rpm(0, wait)
    }

    pub fn warning(&self) -> CommandResult<i64> {
        self.ensure_ready()?;
        self.handle.read_i64("sdr_get_warning")
    }

    pub fn is_running(&self) -> CommandResult<bool> {
        self.ensure_ready()?;
        self.handle.read_bool("sdr_get_motor_running")
    }

    pub fn is_ramping_up(&self) -> CommandResult<bool> {
        self.ensure_ready()?;
        self.handle.read_bool("sdr_get_motor_ramping_up")
    }

    pub fn is_ramping_down(&self) -> CommandResult<bool> {
        self.ensure_ready()?;
        self.handle.read_bool("sdr_get_motor_ramping_down")
    }

    pub fn is_stopped(&self) -> CommandResult<bool> {
        self.ensure_ready()?;
        self.handle.read_bool("sdr_get_motor_stopped")
    }

    pub fn is_button_pressed(&self) -> CommandResult<bool> {
        self.ensure_ready()?;
        self.handle.read_bool("sdr_get_button_pressed")
    }

    /// 当前温度（°C）
    pub fn temperature(&self) -> CommandResult<f64> {
        self.ensure_ready()?;
        self.handle.read_f64("sdr_get_current_temp_c")
    }

    pub fn rpm(&self) -> CommandResult<f64> {
        self.ensure_ready()?;
        self.handle.read_f64("sdr_get_current_rpm")
    }
}
