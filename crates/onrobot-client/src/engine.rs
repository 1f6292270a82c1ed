//! 命令确认引擎
//!
//! 控制器上的动作命令是异步的：启动调用立即返回，物理动作随后才发生。
//! 客户端通过轮询设备状态变量自行构造「完成」信号。
//!
//! 一个命令的确认由若干**阶段**（[`CommandPhase`]）按顺序组成，例如
//! 「忙碌清除 → 抓取检测 → 力控抓取检测」。状态机：
//!
//! ```text
//! Idle ──start call──▶ Phase[0] ──▶ Phase[1] ──▶ … ──▶ Confirmed
//!                          │            │
//!                          └────────────┴──────▶ TimedOut(phase)
//! ```
//!
//! # 轮询计数
//!
//! 一次「轮询」是一次谓词求值。第一次求值立即进行，之后每次求值前睡眠一个
//! 间隔。第 k 次轮询成功的阶段消耗 k 次轮询、k−1 次睡眠；超时的阶段消耗
//! `max_polls` 次轮询。超时时间因此是「轮询次数 × 间隔」，而不是单调时钟
//! 截止时间。
//!
//! 引擎本身不做任何补偿或重试，超时后的恢复动作由设备句柄负责。

use crate::error::CommandResult;
use crate::mask::{Channel, ChannelMask};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ==================== 睡眠 ====================

/// 轮询间隔的睡眠实现
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// 在调用线程上阻塞睡眠
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 虚拟时钟：只累计请求的睡眠时长，不真正睡眠
///
/// 用于仿真与测试，配合 `MockLink` 可在毫秒级内跑完 3 分钟的标定流程。
#[derive(Debug, Default)]
pub struct VirtualSleeper {
    state: Mutex<(Duration, usize)>,
}

impl VirtualSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计的虚拟时间
    pub fn elapsed(&self) -> Duration {
        self.state.lock().0
    }

    /// 睡眠次数
    pub fn sleeps(&self) -> usize {
        self.state.lock().1
    }

    pub fn reset(&self) {
        *self.state.lock() = (Duration::ZERO, 0);
    }
}

impl Sleeper for VirtualSleeper {
    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.0 += duration;
        state.1 += 1;
    }
}

// ==================== 阶段 ====================

/// 确认阶段的语义类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseKind {
    /// 设备忙碌标志清除
    Busy,
    /// 抓取检测
    GripDetected,
    /// 力控抓取检测（3FG）
    ForceGripDetected,
    /// 各通道真空度达到目标
    VacuumReached,
    /// 真空释放完成
    VacuumReleased,
    /// 真空抓取检测（2FGP20）
    VacuumGripped,
    /// 磁力达到设定值
    StrengthReached,
    /// 磁力归零
    StrengthReleased,
    /// 电机开始运转
    MotorRunning,
    /// 转速稳定（不再加速 / 减速）
    SpeedSettled,
    /// 电机停止
    MotorStopped,
    /// 急停解除
    EStopCleared,
}

impl PhaseKind {
    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Busy => "busy-clear",
            PhaseKind::GripDetected => "grip-detect",
            PhaseKind::ForceGripDetected => "force-grip-detect",
            PhaseKind::VacuumReached => "vacuum-reached",
            PhaseKind::VacuumReleased => "vacuum-released",
            PhaseKind::VacuumGripped => "vacuum-grip",
            PhaseKind::StrengthReached => "strength-reached",
            PhaseKind::StrengthReleased => "strength-released",
            PhaseKind::MotorRunning => "motor-running",
            PhaseKind::SpeedSettled => "speed-settled",
            PhaseKind::MotorStopped => "motor-stopped",
            PhaseKind::EStopCleared => "estop-cleared",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 阶段标识：在阶段列表中的位置 + 类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseId {
    pub index: usize,
    pub kind: PhaseKind,
}

impl PhaseId {
    /// 多通道真空度确认使用的阶段标识
    pub const VACUUM: PhaseId = PhaseId {
        index: 0,
        kind: PhaseKind::VacuumReached,
    };

    pub fn new(index: usize, kind: PhaseKind) -> Self {
        Self { index, kind }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {} ({})", self.index, self.kind)
    }
}

type Predicate<'a> = Box<dyn FnMut() -> CommandResult<bool> + 'a>;

/// 一个确认阶段
///
/// 谓词返回 `Ok(true)` 表示本阶段已满足；返回错误会立即中止确认。
pub struct CommandPhase<'a> {
    pub kind: PhaseKind,
    pub interval: Duration,
    pub max_polls: u32,
    predicate: Predicate<'a>,
}

impl<'a> CommandPhase<'a> {
    /// 以默认间隔（100ms）创建阶段
    ///
    /// `max_polls` 为 0 时按 1 处理：每个阶段至少求值一次。
    pub fn new<F>(kind: PhaseKind, max_polls: u32, predicate: F) -> Self
    where
        F: FnMut() -> CommandResult<bool> + 'a,
    {
        Self {
            kind,
            interval: DEFAULT_POLL_INTERVAL,
            max_polls,
            predicate: Box::new(predicate),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 本阶段最坏情况下的等待时长
    pub fn budget(&self) -> Duration {
        self.interval * self.max_polls.max(1).saturating_sub(1)
    }
}

impl fmt::Debug for CommandPhase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandPhase")
            .field("kind", &self.kind)
            .field("interval", &self.interval)
            .field("max_polls", &self.max_polls)
            .finish_non_exhaustive()
    }
}

// ==================== 结果 ====================

/// 一次命令调用的结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandOutcome {
    Confirmed,
    TimedOut(PhaseId),
    NotConnected,
    InvalidParameter,
}

/// 确认过程的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub outcome: CommandOutcome,
    /// 总轮询次数
    pub polls: u32,
    /// 每个已执行阶段消耗的轮询次数
    pub phase_polls: Vec<u32>,
}

impl Confirmation {
    fn confirmed() -> Self {
        Self {
            outcome: CommandOutcome::Confirmed,
            polls: 0,
            phase_polls: Vec::new(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.outcome == CommandOutcome::Confirmed
    }
}

/// 多通道真空度确认的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfirmation {
    pub outcome: CommandOutcome,
    pub polls: u32,
    /// 超时时仍低于目标的通道
    pub below: ChannelMask,
}

// ==================== 引擎 ====================

/// 命令确认引擎
#[derive(Clone)]
pub struct ConfirmationEngine {
    sleeper: Arc<dyn Sleeper>,
}

impl Default for ConfirmationEngine {
    fn default() -> Self {
        Self::new(Arc::new(ThreadSleeper))
    }
}

impl fmt::Debug for ConfirmationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationEngine").finish_non_exhaustive()
    }
}

impl ConfirmationEngine {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper }
    }

    /// 固定时长的等待（初始化后的稳定时间等）
    pub fn settle(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// 按顺序执行确认阶段
    ///
    /// # 参数
    ///
    /// - `phases`: 阶段列表，调用方已发出启动命令
    /// - `wait`: 为 `false` 时不轮询，立即返回 `Confirmed`
    ///
    /// # 返回
    ///
    /// - `Confirmed`：所有阶段都在预算内满足
    /// - `TimedOut(phase)`：第一个未满足的阶段，后续阶段不会被轮询
    ///
    /// # 错误
    ///
    /// 谓词返回的错误（通常是传输失败）原样向上传播。
    pub fn confirm(&self, phases: Vec<CommandPhase<'_>>, wait: bool) -> CommandResult<Confirmation> {
        let mut confirmation = Confirmation::confirmed();
        if !wait {
            return Ok(confirmation);
        }

        for (index, mut phase) in phases.into_iter().enumerate() {
            let id = PhaseId::new(index, phase.kind);
            let budget = phase.max_polls.max(1);
            let mut polls = 0;

            let satisfied = loop {
                polls += 1;
                if (phase.predicate)()? {
                    break true;
                }
                if polls >= budget {
                    break false;
                }
                self.sleeper.sleep(phase.interval);
            };

            confirmation.polls += polls;
            confirmation.phase_polls.push(polls);
            trace!("{}: satisfied={} after {} polls", id, satisfied, polls);

            if !satisfied {
                confirmation.outcome = CommandOutcome::TimedOut(id);
                return Ok(confirmation);
            }
        }

        Ok(confirmation)
    }

    /// 多目标电平确认
    ///
    /// 只要任一通道读数仍低于自己的目标就继续轮询，共用一个轮询预算。
    /// 超时后在 `below` 中报告仍未达标的通道，是否补偿由调用方决定。
    pub fn confirm_levels<F>(
        &self,
        targets: &[(Channel, f64)],
        max_polls: u32,
        interval: Duration,
        wait: bool,
        mut read: F,
    ) -> CommandResult<LevelConfirmation>
    where
        F: FnMut(Channel) -> CommandResult<f64>,
    {
        if !wait || targets.is_empty() {
            return Ok(LevelConfirmation {
                outcome: CommandOutcome::Confirmed,
                polls: 0,
                below: ChannelMask::EMPTY,
            });
        }

        let budget = max_polls.max(1);
        let mut polls = 0;
        loop {
            polls += 1;
            let mut below = ChannelMask::EMPTY;
            for (channel, target) in targets {
                if read(*channel)? < *target {
                    below.insert(*channel);
                }
            }

            if below.is_empty() {
                trace!("levels reached after {} polls", polls);
                return Ok(LevelConfirmation {
                    outcome: CommandOutcome::Confirmed,
                    polls,
                    below,
                });
            }
            if polls >= budget {
                trace!("levels still below target on {} after {} polls", below, polls);
                return Ok(LevelConfirmation {
                    outcome: CommandOutcome::TimedOut(PhaseId::VACUUM),
                    polls,
                    below,
                });
            }
            self.sleeper.sleep(interval);
        }
    }
}
