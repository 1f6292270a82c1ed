//! # OnRobot Protocol
//!
//! 末端工具控制器（Compute Box）XML-RPC 协议定义（无传输层依赖）
//!
//! ## 模块
//!
//! - `value`: 远程调用参数与返回值的动态类型 [`Value`]
//! - `xmlrpc`: `methodCall` 编码 / `methodResponse` 解码
//! - `ids`: 设备标识常量、机器人类型、默认端口
//! - `types`: 工具槽位、位姿、关节、力/力矩等数据记录
//!
//! ## 调用约定
//!
//! 所有远程调用均为「方法名 + 位置参数 → 单一返回值」。复合返回值是扁平的
//! 字段表（XML-RPC `struct`），由本 crate 负责解码为强类型记录。

pub mod ids;
pub mod types;
pub mod value;
pub mod xmlrpc;

// 重新导出常用类型
pub use ids::*;
pub use types::*;
pub use value::Value;

use thiserror::Error;

/// 协议层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// XML 文档结构错误（标签不匹配、意外结束等）
    #[error("Malformed XML-RPC document: {0}")]
    Malformed(String),

    /// 不支持的值类型标签
    #[error("Unsupported XML-RPC value type: <{0}>")]
    UnsupportedType(String),

    /// 标量文本解析失败
    #[error("Parse error: cannot read {text:?} as {kind}")]
    ParseError { kind: &'static str, text: String },

    /// 返回值类型与期望不符
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// 复合返回值缺少字段
    #[error("Missing field in remote struct: {0}")]
    MissingField(String),

    /// 数组长度不符
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 未知设备标识
    #[error("Unknown device identity: 0x{0:X}")]
    UnknownIdentity(i64),
}
