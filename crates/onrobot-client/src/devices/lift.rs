//! LIFT100 升降柱
//!
//! 固定索引 100，远程调用不带索引。错误寄存器：
//!
//! | 位 | 含义 |
//! |----|------|
//! | 0x01 | 急停 |
//! | 0x08 | 编码器不匹配（未初始化） |
//! | 0xFFFE | 除急停外的所有错误 |

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, LIFT_INDEX, ToolSlot, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub static LIFT_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "LIFT",
    identities: &[DeviceIdentity::Lift],
    addressing: Addressing::Fixed {
        index: LIFT_INDEX,
        in_calls: false,
    },
    presence: Presence::Device,
};

pub const ESTOP_BIT: i64 = 0x01;
pub const ERROR_MASK: i64 = 0xFFFE;
pub const NOT_INITIALIZED_BIT: i64 = 1 << 3;

/// 位置容差（mm）
pub const POSITION_TOLERANCE: f64 = 1.0;

const INIT_POLLS: u32 = 2000;
const MOVE_POLLS: u32 = 1500;
const ESTOP_POLLS: u32 = 100;
const START_SETTLE: Duration = Duration::from_millis(100);

/// LIFT 句柄
#[derive(Debug, Clone)]
pub struct Lift {
    handle: ActuatorHandle,
}

impl Lift {
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &LIFT_FAMILY,
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

    /// 初始化（升降柱会移动到最低点）
    ///
    /// # 错误
    ///
    /// - 急停状态：`DeviceFault`，不发出命令
    /// - 忙碌 2000 次未清除：`TimedOut`
    /// - 完成后处于急停或有错误：`DeviceFault`
    pub fn initialize(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.reject_estop()?;

        self.handle.command("lift_initialize", &[])?;
        self.handle.settle(START_SETTLE);
        self.handle.confirm(
            "initialize",
            vec![self.handle.busy_phase("lift_get_busy", INIT_POLLS)],
            true,
        )?;

        self.reject_estop()?;
        let error = self.read_register()? & ERROR_MASK;
        if error != 0 {
            return Err(self.fault(format!("error 0x{error:X} during initialization")));
        }
        info!("LIFT initialized");
        Ok(())
    }

    /// 以给定速度移动到目标位置
    ///
    /// # 参数
    ///
    /// - `position`: 0..=900 mm
    /// - `speed`: 1..=100 %
    ///
    /// 已在目标 1 mm 范围内时直接返回。移动完成后再读一次位置，仍不在
    /// 容差内时返回 `DeviceFault`，不会自动重试。
    pub fn move_to(&self, position: f64, speed: f64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("position", position, 0.0, 900.0)?;
        self.handle.check_range("speed", speed, 1.0, 100.0)?;

        let register = self.read_register()?;
        if register & ERROR_MASK & NOT_INITIALIZED_BIT != 0 {
            return Err(self.handle.fail(CommandError::Usage(
                "lift is not initialized".to_string(),
            )));
        }
        if register & ESTOP_BIT != 0 {
            return Err(self.fault("emergency stop is active"));
        }

        let current = self.handle.read_f64("lift_get_position")?;
        if (current - position).abs() <= POSITION_TOLERANCE {
            debug!("LIFT already at {:.1} mm", current);
            return Ok(());
        }
        if register & ERROR_MASK != 0 {
            return Err(self.fault(format!("error 0x{:X} is active", register & ERROR_MASK)));
        }

        self.handle.command(
            "lift_move",
            &[Value::Double(position), Value::Double(speed)],
        )?;
        self.handle.settle(START_SETTLE);

        let phases = vec![
            self.handle.busy_phase("lift_get_busy", MOVE_POLLS),
            CommandPhase::new(PhaseKind::EStopCleared, ESTOP_POLLS, || {
                Ok(self.read_register()? & ESTOP_BIT == 0)
            }),
        ];
        self.handle.confirm("move", phases, true)?;

        let reached = self.handle.read_f64("lift_get_position")?;
        if (reached - position).abs() > POSITION_TOLERANCE {
            return Err(self.fault(format!(
                "stopped at {reached:.1} mm, target was {position:.1} mm"
            )));
        }
        Ok(())
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("lift_stop", &[])
    }

    // ==================== 状态 ====================

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("lift_get_busy")
    }

    pub fn position(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("lift_get_position")
    }

    pub fn speed(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle.read_f64("lift_get_speed")
    }

    /// 错误寄存器（已屏蔽急停位）
    pub fn error(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        Ok(self.read_register()? & ERROR_MASK)
    }

    pub fn is_estop(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        Ok(self.read_register()? & ESTOP_BIT != 0)
    }

    pub fn is_initialized(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        Ok(self.read_register()? & NOT_INITIALIZED_BIT == 0)
    }

    fn read_register(&self) -> CommandResult<i64> {
        self.handle.read_i64("lift_get_error")
    }

    fn reject_estop(&self) -> CommandResult<()> {
        if self.read_register()? & ESTOP_BIT != 0 {
            Err(self.fault("emergency stop is active"))
        } else {
            Ok(())
        }
    }

    fn fault(&self, message: impl Into<String>) -> CommandError {
        self.handle
            .fail(CommandError::device_fault(LIFT_FAMILY.name, message))
    }
}
