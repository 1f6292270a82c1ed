//! OnRobot SDK - OnRobot 末端工具 Rust SDK
//!
//! 通过 Compute Box / Eyes 控制器的 XML-RPC 接口控制夹爪、真空吸盘、
//! 螺丝刀、打磨机、升降柱等末端工具。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 远程调用的值类型、XML-RPC 编解码、设备标识
//! - **驱动层** (`driver`): 远程链路、会话与配置
//! - **客户端层** (`client`): 命令确认引擎与各设备族句柄
//!
//! # 快速开始
//!
//! ```no_run
//! use onrobot_sdk::prelude::*;
//!
//! onrobot_sdk::init_logger();
//! let tools = OnRobot::new(SessionConfig::with_ip("192.168.1.1"));
//! let gripper = tools.two_fg(ToolSlot::Single);
//! gripper.grip_external(40.0, 60, 50, true)?;
//! # Ok::<(), CommandError>(())
//! ```

pub use onrobot_client as client;
pub use onrobot_driver as driver;
pub use onrobot_protocol as protocol;

mod logging;
pub mod prelude;
mod toolbox;

pub use logging::{init_logger, try_init_logger};
pub use toolbox::{OnRobot, OnRobotBuilder};

// --- 用户以此为界 ---

// 协议层
pub use protocol::{DeviceIdentity, ForceTorque, JointPositions, Pose, ProtocolError, ToolSlot, Value};

// 驱动层
pub use driver::{DeviceSession, DriverError, SessionBuilder, SessionConfig};

// 客户端层
pub use client::{ChannelMask, CommandError, CommandOutcome, CommandResult};
