//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 订阅者，过滤规则取自 `RUST_LOG`，
//! 未设置时为 `info`。依赖 `log` 宏的库输出经 `tracing-log` 桥接。

use tracing_subscriber::EnvFilter;

/// 默认过滤级别
const DEFAULT_FILTER: &str = "info";

/// 初始化全局日志
///
/// 已经初始化过（或应用自行安装了订阅者）时静默忽略。
pub fn init_logger() {
    if let Err(e) = try_init_logger() {
        tracing::debug!("Logger already initialized: {}", e);
    }
}

/// 初始化全局日志，失败时返回错误
///
/// # 错误
///
/// 全局订阅者或 `log` 桥接已被设置。
pub fn try_init_logger() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
