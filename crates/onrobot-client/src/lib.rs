//! # OnRobot Client
//!
//! 设备句柄与命令确认引擎。
//!
//! 控制器上的大多数命令「发出即返回」：远程调用成功只表示命令被接受，
//! 不表示动作已经完成。本 crate 在启动命令之后按有序的确认阶段轮询设备
//! 状态（忙碌清除、抓取检测、真空到达等），每个阶段有独立的轮询预算，
//! 并把结果报告为「已确认」或「在某阶段超时」。
//!
//! ## 模块
//!
//! - `engine`: [`ConfirmationEngine`]、[`CommandPhase`] 与可替换的 [`Sleeper`]
//! - `handle`: 所有设备族共用的 [`ActuatorHandle`]
//! - `mask`: 真空通道掩码与按槽位的掩码累加器
//! - `devices`: 各设备族句柄
//! - `error`: [`CommandError`]
//!
//! # 示例
//!
//! ```no_run
//! use onrobot_client::devices::Rg;
//! use onrobot_driver::{DeviceSession, SessionConfig};
//! use onrobot_protocol::ToolSlot;
//!
//! let session = DeviceSession::new(SessionConfig::with_ip("192.168.1.1"));
//! let rg = Rg::new(&session, ToolSlot::Single);
//! rg.grip(40.0, 20.0, true)?;
//! # Ok::<(), onrobot_client::CommandError>(())
//! ```

pub mod devices;
pub mod engine;
pub mod error;
pub mod handle;
pub mod mask;

// 重新导出常用类型
pub use engine::{
    CommandOutcome, CommandPhase, Confirmation, ConfirmationEngine, DEFAULT_POLL_INTERVAL,
    LevelConfirmation, PhaseId, PhaseKind, Sleeper, ThreadSleeper, VirtualSleeper,
};
pub use error::{CommandError, CommandResult};
pub use handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
pub use mask::{Channel, ChannelAccumulator, ChannelMask};
