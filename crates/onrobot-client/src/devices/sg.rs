//! SG 软体夹爪
//!
//! 使用前必须以工具型号初始化。初始化后所有动作和读数都要求设备已初始化，
//! 否则返回用法错误。

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub static SG_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "SG",
    identities: &[DeviceIdentity::Sg],
    addressing: Addressing::PerSlot,
    presence: Presence::Device,
};

const INIT_POLLS: u32 = 40;
const GRIP_POLLS: u32 = 30;
/// 初始化完成后的稳定时间
const INIT_SETTLE: Duration = Duration::from_secs(2);

/// 工具型号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum SgTool {
    SgA = 1,
    SgB = 2,
    SgC = 3,
}

/// 当前型号的开口范围（mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenLimits {
    pub min_open: f64,
    pub max_open: f64,
}

/// SG 句柄
#[derive(Debug, Clone)]
pub struct Sg {
    handle: ActuatorHandle,
}

impl Sg {
    pub fn new(session: &DeviceSession, slot: ToolSlot) -> Self {
        Self::from_handle(ActuatorHandle::new(session, &SG_FAMILY, slot))
    }

    pub fn from_handle(handle: ActuatorHandle) -> Self {
        Self { handle }
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self::from_handle(self.handle.with_sleeper(sleeper))
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    /// 以给定工具型号初始化
    ///
    /// 忙碌清除（40 次）后检查初始化返回码，成功后再等待 2 秒。
    ///
    /// # 错误
    ///
    /// - 忙碌超时：`TimedOut`
    /// - 返回码非 0：`DeviceFault`
    pub fn initialize(&self, tool: SgTool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let code = self
            .handle
            .call("sg_initialize", &[Value::Int(tool as i64)])?
            .as_i64()?;

        let busy = CommandPhase::new(PhaseKind::Busy, INIT_POLLS, || {
            self.read_busy().map(|busy| !busy)
        });
        self.handle.confirm("initialize", vec![busy], true)?;

        if code != 0 {
            return Err(self.handle.fail(CommandError::device_fault(
                SG_FAMILY.name,
                format!("initialization failed with code {code}"),
            )));
        }
        self.handle.settle(INIT_SETTLE);
        info!("SG initialized as {:?} on slot {}", tool, self.handle.slot());
        Ok(())
    }

    /// 按数值型号初始化（1 / 2 / 3）
    pub fn initialize_id(&self, tool_id: i64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let tool = match tool_id {
            1 => SgTool::SgA,
            2 => SgTool::SgB,
            3 => SgTool::SgC,
            other => {
                return Err(self.handle.fail(CommandError::invalid_parameter(
                    "tool_id",
                    other,
                    "one of [1, 2, 3]",
                )));
            }
        };
        self.initialize(tool)
    }

    pub fn is_initialized(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.handle.read_bool("sg_get_initialized")
    }

    /// 普通抓取
    pub fn grip(&self, width: i64, wait: bool) -> CommandResult<()> {
        self.grip_with(width, false, wait)
    }

    /// 轻柔抓取
    pub fn gentle_grip(&self, width: i64, wait: bool) -> CommandResult<()> {
        self.grip_with(width, true, wait)
    }

    fn grip_with(&self, width: i64, gentle: bool, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.require_initialized()?;
        let limits = self.read_limits()?;
        self.handle.check_range(
            "width",
            width as f64,
            limits.min_open,
            limits.max_open,
        )?;

        // 最后一个参数固定为 true（抓取而非张开）
        self.handle.command(
            "sg_grip",
            &[Value::Int(width), Value::Bool(gentle), Value::Bool(true)],
        )?;

        let busy = CommandPhase::new(PhaseKind::Busy, GRIP_POLLS, || {
            self.read_busy().map(|busy| !busy)
        });
        self.handle.confirm("grip", vec![busy], wait)
    }

    pub fn home(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.require_initialized()?;
        self.handle.command("sg_home", &[])
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("sg_stop", &[])
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        self.read_busy()
    }

    pub fn width(&self) -> CommandResult<f64> {
        self.initialized_read("sg_get_width")
    }

    pub fn depth(&self) -> CommandResult<f64> {
        self.initialized_read("sg_get_depth")
    }

    /// 静态硅胶深度，即最大深度
    pub fn max_depth(&self) -> CommandResult<f64> {
        self.initialized_read("sg_get_depth_static_silicone")
    }

    pub fn open_limits(&self) -> CommandResult<OpenLimits> {
        self.handle.ensure_connected()?;
        self.require_initialized()?;
        self.read_limits()
    }

    fn initialized_read(&self, method: &str) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        self.require_initialized()?;
        self.handle.read_f64(method)
    }

    fn require_initialized(&self) -> CommandResult<()> {
        if self.is_initialized()? {
            Ok(())
        } else {
            Err(self.handle.fail(CommandError::Usage(
                "soft gripper is not initialized, initialize first".to_string(),
            )))
        }
    }

    fn read_busy(&self) -> CommandResult<bool> {
        let vars = self.handle.read_value("sg_get_all_variables")?;
        Ok(vars.field("busy")?.as_bool()?)
    }

    fn read_limits(&self) -> CommandResult<OpenLimits> {
        let limits = self.handle.read_value("sg_get_min_max")?;
        Ok(OpenLimits {
            min_open: limits.field("min_open")?.as_f64()?,
            max_open: limits.field("max_open")?.as_f64()?,
        })
    }
}
