//! 命令错误类型
//!
//! 设备句柄的所有公开操作都返回 [`CommandResult`]。错误分为：
//!
//! - **未连接**：目标槽位上没有对应设备，或会话链路不可用
//! - **参数无效**：参数越界、位姿无效、用法错误，不会发出任何启动命令
//! - **确认超时**：某个确认阶段在轮询预算内未满足
//! - **设备故障**：设备状态字上报的错误
//! - **传输失败**：链路层错误
//!
//! 每个错误的 `Display` 即为面向操作员的提示信息，句柄在返回前会以
//! `warn!` 记录一次。

use crate::engine::{CommandOutcome, PhaseId};
use crate::mask::ChannelMask;
use onrobot_driver::DriverError;
use thiserror::Error;

/// 命令结果
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// 命令错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    // ==================== 前置检查 ====================
    /// 设备未连接
    #[error("No {family} connected ({location})")]
    NotConnected {
        /// 设备族名称
        family: &'static str,
        /// 槽位描述，或链路不可用的原因
        location: String,
    },

    /// 参数越界
    #[error("Invalid parameter '{param}': {value} (expected {range})")]
    InvalidParameter {
        /// 参数名
        param: &'static str,
        /// 实际值
        value: String,
        /// 允许范围
        range: String,
    },

    /// 控制器返回了「无有效位置」哨兵
    #[error("Invalid pose: {0}")]
    InvalidPose(String),

    /// 调用方式错误（空通道集合、前置操作未完成等）
    #[error("Usage error: {0}")]
    Usage(String),

    // ==================== 执行结果 ====================
    /// 确认阶段超时
    #[error("{family} command timed out in {phase}")]
    TimedOut {
        family: &'static str,
        phase: PhaseId,
    },

    /// 真空度未达到目标（已释放这些通道）
    #[error("Vacuum level not reached on channel {channels}")]
    VacuumNotReached { channels: ChannelMask },

    /// 设备上报故障
    #[error("{family} fault: {message}")]
    DeviceFault {
        family: &'static str,
        message: String,
    },

    // ==================== 传输 ====================
    /// 链路层错误
    #[error("Transport failure: {0}")]
    Transport(DriverError),
}

impl CommandError {
    pub fn invalid_parameter(
        param: &'static str,
        value: impl ToString,
        range: impl ToString,
    ) -> Self {
        Self::InvalidParameter {
            param,
            value: value.to_string(),
            range: range.to_string(),
        }
    }

    pub fn device_fault(family: &'static str, message: impl Into<String>) -> Self {
        Self::DeviceFault {
            family,
            message: message.into(),
        }
    }

    /// 对应的命令结果分类
    ///
    /// 设备故障和传输失败不属于确认协议本身的结果，返回 `None`。
    pub fn outcome(&self) -> Option<CommandOutcome> {
        match self {
            Self::NotConnected { .. } => Some(CommandOutcome::NotConnected),
            Self::InvalidParameter { .. } | Self::InvalidPose(_) | Self::Usage(_) => {
                Some(CommandOutcome::InvalidParameter)
            }
            Self::TimedOut { phase, .. } => Some(CommandOutcome::TimedOut(*phase)),
            Self::VacuumNotReached { .. } => Some(CommandOutcome::TimedOut(PhaseId::VACUUM)),
            Self::DeviceFault { .. } | Self::Transport(_) => None,
        }
    }

    /// 是否在发出启动命令之前就被拒绝
    pub fn is_rejected_before_dispatch(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. }
                | Self::InvalidParameter { .. }
                | Self::InvalidPose(_)
                | Self::Usage(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::VacuumNotReached { .. })
    }
}

impl From<DriverError> for CommandError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::LinkUnavailable(reason) => Self::NotConnected {
                family: "controller",
                location: reason,
            },
            other => Self::Transport(other),
        }
    }
}

impl From<onrobot_protocol::ProtocolError> for CommandError {
    fn from(err: onrobot_protocol::ProtocolError) -> Self {
        Self::Transport(DriverError::Protocol(err))
    }
}
