//! # OnRobot Driver
//!
//! 远程链路与会话管理层。
//!
//! ## 模块
//!
//! - `link`: [`RemoteLink`] trait 与不可用链路
//! - `http`: XML-RPC over HTTP 链路 [`XmlRpcLink`]
//! - `session`: 惰性建立链路、一次性上报机器人类型的 [`DeviceSession`]
//! - `builder`: [`SessionBuilder`]
//! - `config`: 可从 TOML 加载的 [`SessionConfig`]
//! - `mock`: 脚本化测试链路 `MockLink`（需要 `mock` feature）

pub mod builder;
pub mod config;
pub mod error;
pub mod http;
pub mod link;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod session;

pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use error::DriverError;
pub use http::XmlRpcLink;
pub use link::{RemoteLink, RemoteLinkExt, UnusableLink};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockLink, RecordedCall};
pub use session::DeviceSession;
