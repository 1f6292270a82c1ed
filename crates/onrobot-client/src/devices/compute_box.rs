//! Compute Box 数字 I/O 与 WebLogic
//!
//! 数字输出和下降沿监视需要控制器上运行专用的 WebLogic 程序：输出 `n`
//! 映射到 WebLogic 变量 `n - 1`，输入 `n` 的下降沿标志在变量 `n + 7`。

use crate::engine::Sleeper;
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{JointPositions, Pose, ToolSlot, Value};
use std::sync::Arc;

pub static COMPUTE_BOX_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "ComputeBox",
    identities: &[],
    addressing: Addressing::Controller,
    presence: Presence::Always,
};

const IO_COUNT: i64 = 8;
const WEBLOGIC_VARIABLES: i64 = 15;
/// 下降沿标志变量相对输入编号的偏移
const FALLING_EDGE_OFFSET: i64 = 7;

/// Compute Box I/O 句柄
#[derive(Debug, Clone)]
pub struct ComputeBox {
    handle: ActuatorHandle,
}

impl ComputeBox {
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &COMPUTE_BOX_FAMILY,
            ToolSlot::default(),
        ))
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

    /// 数字输入状态（1..=8）
    pub fn digital_input(&self, io: i64) -> CommandResult<bool> {
        self.handle.check_range("io", io, 1, IO_COUNT)?;
        let inputs = self.handle.call("cb_get_digital_inputs", &[])?.as_i64()?;
        if inputs == -1 {
            return Err(self.handle.fail(CommandError::device_fault(
                COMPUTE_BOX_FAMILY.name,
                "failed to read digital inputs",
            )));
        }
        Ok(inputs & (1 << (io - 1)) != 0)
    }

    /// WebLogic 变量（1..=15）
    pub fn weblogic_variable(&self, id: i64) -> CommandResult<i64> {
        self.handle.check_range("variable", id, 1, WEBLOGIC_VARIABLES)?;
        Ok(self
            .handle
            .call("cb_get_weblogic_variable", &[Value::Int(id)])?
            .as_i64()?)
    }

    pub fn set_weblogic_variable(&self, id: i64, value: i16) -> CommandResult<()> {
        self.handle.check_range("variable", id, 1, WEBLOGIC_VARIABLES)?;
        self.handle.command(
            "cb_set_weblogic_variable",
            &[Value::Int(id), Value::from(i32::from(value))],
        )
    }

    pub fn run_weblogic_program(&self, program: i64) -> CommandResult<()> {
        self.handle
            .command("cb_weblogic_run", &[Value::Int(program)])
    }

    pub fn stop_weblogic_program(&self) -> CommandResult<()> {
        self.handle.command("cb_weblogic_stop", &[])
    }

    /// 设置数字输出（1..=8）
    pub fn set_output(&self, io: i64, on: bool) -> CommandResult<()> {
        self.handle.check_range("io", io, 1, IO_COUNT)?;
        self.handle.command(
            "cb_set_weblogic_variable",
            &[Value::Int(io - 1), Value::Int(i64::from(on))],
        )
    }

    /// 输入（1..=8）是否出现过下降沿（例如托盘被取走）
    pub fn monitor_input(&self, io: i64) -> CommandResult<bool> {
        self.handle.check_range("io", io, 1, IO_COUNT)?;
        let flag = self
            .handle
            .call(
                "cb_get_weblogic_variable",
                &[Value::Int(io + FALLING_EDGE_OFFSET)],
            )?
            .as_i64()?;
        if flag < 0 {
            return Err(self.handle.fail(CommandError::device_fault(
                COMPUTE_BOX_FAMILY.name,
                format!("invalid falling edge flag {flag} for input {io}"),
            )));
        }
        Ok(flag > 0)
    }

    /// 上报机器人当前笛卡尔位姿与关节角
    pub fn send_pose(&self, pose: &Pose, joints: &JointPositions) -> CommandResult<()> {
        self.handle.command(
            "cb_send_pose",
            &[pose.to_cart_value(), joints.to_value()],
        )
    }
}
