//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use onrobot_sdk::prelude::*;
//! ```

pub use crate::OnRobot;

// 设备句柄
pub use crate::client::devices::{
    ComputeBox, Eyes, Fgp, Finger, GripDirection, Hex, Lift, Mg, Rg, Rg2Ft, Sander, Screwdriver,
    Sg, SgTool, ThreeFg, TwoFg, Vg, Vgp, Weblytics,
};

// 确认协议
pub use crate::client::{Channel, ChannelMask, CommandOutcome, PhaseId, PhaseKind};

// 会话与数据类型
pub use crate::driver::{DeviceSession, SessionBuilder, SessionConfig};
pub use crate::protocol::{ForceTorque, JointPositions, Pose, ToolSlot};

// 错误类型
pub use crate::client::{CommandError, CommandResult};
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
