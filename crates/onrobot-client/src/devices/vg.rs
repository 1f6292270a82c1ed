//! VG10 / VGC10 双通道真空吸盘
//!
//! 抓取使用多目标电平确认：任一通道低于目标就继续轮询。超时后只释放
//! 未达标的通道，已达标的通道保持吸附。

use crate::engine::{CommandOutcome, CommandPhase, DEFAULT_POLL_INTERVAL, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use crate::mask::Channel;
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ProtocolError, ToolSlot, Value};
use std::sync::Arc;
use tracing::warn;

pub static VG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "VG",
    identities: &[DeviceIdentity::Vg10, DeviceIdentity::Vgc10],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

/// 最大真空度（%）
pub const MAX_VACUUM: f64 = 80.0;
/// 视为已释放的真空度上限（%）
pub const RELEASED_LEVEL: f64 = 0.1;

const GRIP_POLLS: u32 = 40;
const RELEASE_POLLS: u32 = 40;

/// VG10 / VGC10 句柄
#[derive(Debug, Clone)]
pub struct Vg {
    handle: ActuatorHandle,
}

impl Vg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &VG_FAMILY, slot))
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

    pub fn is_vg10(&self) -> CommandResult<bool> {
        Ok(self.handle.ensure_connected()? == Some(DeviceIdentity::Vg10))
    }

    pub fn is_vgc10(&self) -> CommandResult<bool> {
        Ok(self.handle.ensure_connected()? == Some(DeviceIdentity::Vgc10))
    }

    /// 以给定真空度（%）启动两个通道
    ///
    /// 目标为 0 的通道不参与确认。
    ///
    /// # 错误
    ///
    /// - 目标超出 0..=80：`InvalidParameter`
    /// - 40 次轮询后仍有通道未达标：先释放这些通道，再返回
    ///   `VacuumNotReached`，其中列出被释放的通道
    pub fn grip(&self, vacuum_a: f64, vacuum_b: f64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("vacuum_a", vacuum_a, 0.0, MAX_VACUUM)?;
        self.handle.check_range("vacuum_b", vacuum_b, 0.0, MAX_VACUUM)?;

        self.handle
            .command("vg10_grip", &[Value::Int(0), Value::Double(vacuum_a)])?;
        self.handle
            .command("vg10_grip", &[Value::Int(1), Value::Double(vacuum_b)])?;

        let targets: Vec<(Channel, f64)> = [(Channel::A, vacuum_a), (Channel::B, vacuum_b)]
            .into_iter()
            .filter(|(_, target)| *target > 0.0)
            .collect();

        let result = self.handle.engine().confirm_levels(
            &targets,
            GRIP_POLLS,
            DEFAULT_POLL_INTERVAL,
            wait,
            |channel| self.level(channel),
        )?;
        if result.outcome == CommandOutcome::Confirmed {
            return Ok(());
        }

        // 只关闭没有达到目标的通道
        for channel in result.below.channels() {
            let args = [
                Value::Bool(channel == Channel::A),
                Value::Bool(channel == Channel::B),
            ];
            if let Err(e) = self.handle.command("vg10_release", &args) {
                warn!("VG: failed to release channel {} after timeout: {}", channel, e);
            }
        }
        Err(self.handle.fail(CommandError::VacuumNotReached {
            channels: result.below,
        }))
    }

    /// 关闭所选通道
    ///
    /// `wait` 时轮询直到所选通道真空度都不高于 0.1%。两个通道都未选中时
    /// 不做任何确认。
    pub fn release(&self, channel_a: bool, channel_b: bool, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command(
            "vg10_release",
            &[Value::Bool(channel_a), Value::Bool(channel_b)],
        )?;

        if !channel_a && !channel_b {
            return Ok(());
        }

        let released = CommandPhase::new(PhaseKind::VacuumReleased, RELEASE_POLLS, || {
            let (a, b) = self.levels()?;
            Ok((!channel_a || a <= RELEASED_LEVEL) && (!channel_b || b <= RELEASED_LEVEL))
        });
        self.handle.confirm("release", vec![released], wait)
    }

    /// 关闭所选通道的真空泵（不主动释放）
    pub fn idle(&self, channel_a: bool, channel_b: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .command("vg10_idle", &[Value::Bool(channel_a), Value::Bool(channel_b)])
    }

    pub fn vacuum_a(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        Ok(self.levels()?.0)
    }

    pub fn vacuum_b(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        Ok(self.levels()?.1)
    }

    fn level(&self, channel: Channel) -> CommandResult<f64> {
        let (a, b) = self.levels()?;
        Ok(if channel == Channel::A { a } else { b })
    }

    fn levels(&self) -> CommandResult<(f64, f64)> {
        let value = self.handle.read_value("vg10_get_all_double_variables")?;
        let items = value.as_array()?;
        if items.len() < 2 {
            return Err(ProtocolError::InvalidLength {
                expected: 2,
                actual: items.len(),
            }
            .into());
        }
        Ok((items[0].as_f64()?, items[1].as_f64()?))
    }
}
