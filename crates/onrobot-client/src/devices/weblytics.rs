//! WebLytics 生产数据上报
//!
//! 用户变量区间为 32768..=65535，创建句柄时全部清零。

use crate::engine::Sleeper;
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{ToolSlot, Value};
use std::sync::Arc;
use tracing::debug;

pub static WEBLYTICS_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "WebLytics",
    identities: &[],
    addressing: Addressing::Controller,
    presence: Presence::Always,
};

pub const VAR_START_INDEX: i64 = 32768;
pub const VAR_END_INDEX: i64 = 65535;
pub const SECTION_INDEX: i64 = VAR_START_INDEX;
pub const EVENT_START_INDEX: i64 = 32778;
pub const CYCLE_COUNTER_INDEX: i64 = 32868;
pub const FAILED_CYCLE_COUNTER_INDEX: i64 = 32869;
pub const PROGRAM_ID_INDEX: i64 = 32870;

pub const EVENT_COUNT: i64 = 10;
const MAX_ID: i64 = 32767;

/// WebLytics 句柄
#[derive(Debug, Clone)]
pub struct Weblytics {
    handle: ActuatorHandle,
}

impl Weblytics {
    /// 创建句柄并清零所有用户变量
    pub fn new(session: &DeviceSession) -> CommandResult<Self> {
        Self::from_handle(ActuatorHandle::new(
            session,
            &WEBLYTICS_FAMILY,
            ToolSlot::default(),
        ))
    }

    pub fn from_handle(handle: ActuatorHandle) -> CommandResult<Self> {
        let weblytics = Self { handle };
        weblytics.clear()?;
        Ok(weblytics)
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            handle: self.handle.with_sleeper(sleeper),
        }
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    /// 清零所有用户变量
    pub fn clear(&self) -> CommandResult<()> {
        debug!("WebLytics: clearing user variables");
        self.handle.command(
            "cb_set_weblytics_variables",
            &[
                Value::Int(VAR_START_INDEX),
                Value::Int(VAR_END_INDEX),
                Value::Int(0),
            ],
        )
    }

    // ==================== 区段 ====================

    /// 区段开始（1..=32767）
    pub fn section_start(&self, section: i64) -> CommandResult<()> {
        self.handle.check_range("section", section, 1, MAX_ID)?;
        self.set_variable(SECTION_INDEX, section)
    }

    /// 区段结束，上报负的区段号
    pub fn section_stop(&self, section: i64) -> CommandResult<()> {
        self.handle.check_range("section", section, 1, MAX_ID)?;
        self.set_variable(SECTION_INDEX, -section)
    }

    // ==================== 计数器 ====================

    /// 事件计数加一（1..=10），返回新的计数
    pub fn event(&self, event: i64) -> CommandResult<i64> {
        self.handle.check_range("event", event, 1, EVENT_COUNT)?;
        self.increment(EVENT_START_INDEX + event - 1, 1)
    }

    pub fn event_count(&self, event: i64) -> CommandResult<i64> {
        self.handle.check_range("event", event, 1, EVENT_COUNT)?;
        self.increment(EVENT_START_INDEX + event - 1, 0)
    }

    /// 完成一个生产周期
    pub fn cycle(&self) -> CommandResult<i64> {
        self.increment(CYCLE_COUNTER_INDEX, 1)
    }

    pub fn cycle_count(&self) -> CommandResult<i64> {
        self.increment(CYCLE_COUNTER_INDEX, 0)
    }

    /// 发生一个非生产周期
    pub fn non_productive_cycle(&self) -> CommandResult<i64> {
        self.increment(FAILED_CYCLE_COUNTER_INDEX, 1)
    }

    pub fn non_productive_cycle_count(&self) -> CommandResult<i64> {
        self.increment(FAILED_CYCLE_COUNTER_INDEX, 0)
    }

    /// 上报程序编号（1..=32767）
    pub fn set_program_id(&self, program: i64) -> CommandResult<()> {
        self.handle.check_range("program_id", program, 1, MAX_ID)?;
        self.set_variable(PROGRAM_ID_INDEX, program)
    }

    fn set_variable(&self, index: i64, value: i64) -> CommandResult<()> {
        self.handle.command(
            "cb_set_weblytics_variable",
            &[Value::Int(index), Value::Int(value)],
        )
    }

    /// 增量为 0 时即为读取当前值
    fn increment(&self, index: i64, step: i64) -> CommandResult<i64> {
        Ok(self
            .handle
            .call(
                "cb_increment_weblytics_variable",
                &[Value::Int(index), Value::Int(step)],
            )?
            .as_i64()?)
    }
}
