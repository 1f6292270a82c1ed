//! VGP20 四通道真空吸盘
//!
//! 抓取前先用 [`Vgp::set_grip_channels`] / [`Vgp::set_timeout_channels`]
//! 设置通道掩码，掩码按槽位保存：
//!
//! ```text
//! set_grip_channels(&[A])        → A        （单个参数覆盖）
//! set_grip_channels(&[B, C])     → A|B|C    （多个参数按位或）
//! set_grip_channels(&[ALL])      → A|B|C|D
//! ```
//!
//! 同一个 [`Vgp`] 的克隆以及 [`Vgp::for_slot`] 派生的句柄共享这些掩码。

use crate::engine::Sleeper;
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use crate::mask::{Channel, ChannelAccumulator, ChannelMask};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;

pub static VGP_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "VGP",
    identities: &[DeviceIdentity::Vgp],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;

/// 每个槽位的抓取通道与超时通道
#[derive(Debug, Default)]
pub struct VgpChannels {
    required: ChannelAccumulator,
    enabled: ChannelAccumulator,
}

/// 单通道抓取状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgpGripStatus {
    NotGripped,
    Gripped,
    Timeout,
    Lost,
    Unknown(i64),
}

impl From<i64> for VgpGripStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::NotGripped,
            1 => Self::Gripped,
            2 => Self::Timeout,
            3 => Self::Lost,
            other => Self::Unknown(other),
        }
    }
}

/// 单通道释放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgpReleaseStatus {
    NotReleased,
    Released,
    Failed,
    Unknown(i64),
}

impl From<i64> for VgpReleaseStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::NotReleased,
            1 => Self::Released,
            2 => Self::Failed,
            other => Self::Unknown(other),
        }
    }
}

/// VGP20 句柄
#[derive(Debug, Clone)]
pub struct Vgp {
    handle: ActuatorHandle,
    channels: Arc<VgpChannels>,
}

impl Vgp {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &VGP_FAMILY, slot))
    }

    pub fn from_handle(handle: ActuatorHandle) -> Self {
        Self {
            handle,
            channels: Arc::new(VgpChannels::default()),
        }
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            handle: self.handle.with_sleeper(sleeper),
            channels: self.channels,
        }
    }

    /// 同一设备族、另一槽位的句柄，共享通道掩码
    pub fn for_slot(&self, slot: ToolSlot) -> Self {
        let handle = self.handle.for_slot(slot);
        Self {
            handle,
            channels: self.channels.clone(),
        }
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    // ==================== 通道掩码 ====================

    /// 设置超时即判失败的通道（required）
    pub fn set_timeout_channels(&self, channels: &[ChannelMask]) -> CommandResult<ChannelMask> {
        self.channels
            .required
            .apply(self.handle.slot(), "timeout", channels)
            .map_err(|e| self.handle.fail(e))
    }

    /// 设置参与抓取的通道（enabled）
    pub fn set_grip_channels(&self, channels: &[ChannelMask]) -> CommandResult<ChannelMask> {
        self.channels
            .enabled
            .apply(self.handle.slot(), "grip", channels)
            .map_err(|e| self.handle.fail(e))
    }

    pub fn timeout_channels(&self) -> ChannelMask {
        self.channels.required.get(self.handle.slot())
    }

    pub fn grip_channels(&self) -> ChannelMask {
        self.channels.enabled.get(self.handle.slot())
    }

    // ==================== 动作 ====================

    /// 以预先设置的通道抓取，真空度 5..=60 %
    ///
    /// # 错误
    ///
    /// 抓取通道为空时返回 `Usage`，不发出命令。
    pub fn grip(&self, vacuum: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("vacuum", vacuum, 5, 60)?;
        let enabled = self.grip_channels();
        if enabled.is_empty() {
            return Err(self.handle.fail(CommandError::Usage(
                "no grip channels set, call set_grip_channels first".to_string(),
            )));
        }
        let required = self.timeout_channels();

        self.handle.command(
            "vgp_grip",
            &[
                Value::Int(enabled.bits().into()),
                Value::Int(required.bits().into()),
                Value::Int(vacuum),
            ],
        )?;
        self.handle.confirm(
            "grip",
            vec![self.handle.busy_phase("vgp_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    /// 释放给定通道
    ///
    /// 通道参数规则与掩码设置相同：1..=4 个，多个时按位或。
    pub fn release(&self, wait: bool, channels: &[ChannelMask]) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        if channels.is_empty() {
            return Err(self.handle.fail(CommandError::Usage(
                "no channel given to release".to_string(),
            )));
        }
        if channels.len() > 4 {
            return Err(self.handle.fail(CommandError::Usage(
                "too many channel arguments to release, max is 4".to_string(),
            )));
        }
        let mask = channels
            .iter()
            .fold(ChannelMask::EMPTY, |acc, mask| acc | *mask);
        if mask.is_empty() {
            return Err(self.handle.fail(CommandError::Usage(
                "empty channel mask given to release".to_string(),
            )));
        }

        self.handle
            .command("vgp_release", &[Value::Int(mask.bits().into())])?;
        self.handle.confirm(
            "release",
            vec![self.handle.busy_phase("vgp_get_busy", BUSY_POLLS)],
            wait,
        )
    }

    // ==================== 状态 ====================

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("vgp_get_busy")
    }

    /// 通道真空度（%）
    pub fn vacuum(&self, channel: Channel) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.handle
            .read_f64(&format!("vgp_get_vacuum_{}_percent", channel.suffix()))
    }

    pub fn grip_status(&self, channel: Channel) -> CommandResult<VgpGripStatus> {
        self.handle.ensure_connected()?;
        let code = self
            .handle
            .read_i64(&format!("vgp_get_grip_status_{}", channel.suffix()))?;
        Ok(code.into())
    }

    pub fn release_status(&self, channel: Channel) -> CommandResult<VgpReleaseStatus> {
        self.handle.ensure_connected()?;
        let code = self
            .handle
            .read_i64(&format!("vgp_get_release_status_{}", channel.suffix()))?;
        Ok(code.into())
    }

    /// 快换接头错误（必须使用高功率快换）
    pub fn check_qc(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("vgp_get_error_qc")
    }

    /// 电源错误
    pub fn check_psu(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("vgp_get_error_psu")
    }
}
