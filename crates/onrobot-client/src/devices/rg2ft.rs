//! RG2-FT 带力传感与接近传感的二指夹爪
//!
//! 固定索引 -1，所有状态都来自一次 `rg2ft_get_all_variables` 读取。

use crate::engine::{CommandPhase, PhaseKind, Sleeper};
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ForceTorque, HEX_INDEX, ToolSlot, Value};
use std::sync::Arc;

pub static RG2FT_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "RG2FT",
    identities: &[DeviceIdentity::Rg2Ft],
    addressing: Addressing::Fixed {
        index: HEX_INDEX,
        in_calls: false,
    },
    presence: Presence::Device,
};

const BUSY_POLLS: u32 = 30;
const GRIP_DETECT_POLLS: u32 = 20;
const MOVE_FORCE: i64 = 40;
const MAX_PROXIMITY_OFFSET: i64 = 120;

/// `rg2ft_get_all_variables` 的解码结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rg2FtState {
    pub left_ft: ForceTorque,
    pub right_ft: ForceTorque,
    /// 左 / 右接近传感器读数（mm）
    pub left_proximity: f64,
    pub right_proximity: f64,
    pub width: f64,
    pub status: i64,
    pub busy: bool,
    pub grip_detected: bool,
}

impl Rg2FtState {
    fn from_value(vars: &Value) -> CommandResult<Self> {
        Ok(Self {
            left_ft: ForceTorque::from_value(vars.field("left_hex")?)?,
            right_ft: ForceTorque::from_value(vars.field("right_hex")?)?,
            left_proximity: vars.field("left_proxi")?.as_f64()?,
            right_proximity: vars.field("right_proxi")?.as_f64()?,
            width: vars.field("width")?.as_f64()?,
            status: vars.field("status")?.as_i64()?,
            busy: vars.field("busy")?.as_bool()?,
            grip_detected: vars.field("grip_detected")?.as_bool()?,
        })
    }

    /// 指间物体宽度：开口宽度减去两侧接近读数
    pub fn object_width(&self) -> f64 {
        self.width - self.left_proximity - self.right_proximity
    }
}

/// RG2-FT 句柄
#[derive(Debug, Clone)]
pub struct Rg2Ft {
    handle: ActuatorHandle,
}

impl Rg2Ft {
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &RG2FT_FAMILY,
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

    /// 抓取：宽度 0..=100 mm，力 0..=40 N
    pub fn grip(&self, width: i64, force: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("width", width, 0, 100)?;
        self.handle.check_range("force", force, 0, 40)?;
        self.start(width, force)?;

        let phases = vec![
            CommandPhase::new(PhaseKind::Busy, BUSY_POLLS, || {
                Ok(!self.read_state()?.busy)
            }),
            CommandPhase::new(PhaseKind::GripDetected, GRIP_DETECT_POLLS, || {
                Ok(self.read_state()?.grip_detected)
            }),
        ];
        self.handle.confirm("grip", phases, wait)
    }

    /// 移动到目标宽度，不做抓取检测
    pub fn move_to(&self, width: i64, wait: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.check_range("width", width, 0, 100)?;
        self.start(width, MOVE_FORCE)?;

        let busy = CommandPhase::new(PhaseKind::Busy, BUSY_POLLS, || {
            Ok(!self.read_state()?.busy)
        });
        self.handle.confirm("move", vec![busy], wait)
    }

    fn start(&self, width: i64, force: i64) -> CommandResult<()> {
        // 不阻塞、不做深度补偿
        self.handle.command(
            "rg2ft_grip",
            &[
                Value::Int(width),
                Value::Int(force),
                Value::Bool(false),
                Value::Bool(false),
            ],
        )
    }

    pub fn halt(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("rg2ft_grip_stop", &[])
    }

    /// 接近传感器偏移（mm，各 0..=120）
    pub fn set_proximity_offsets(&self, left: i64, right: i64) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .check_range("left_proximity", left, 0, MAX_PROXIMITY_OFFSET)?;
        self.handle
            .check_range("right_proximity", right, 0, MAX_PROXIMITY_OFFSET)?;
        self.handle.command(
            "rg2ft_proxi_offsets",
            &[Value::Int(left), Value::Int(right)],
        )
    }

    /// 以当前接近读数作为偏移
    pub fn set_proximity_offsets_current(&self) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let state = self.read_state()?;
        self.handle.command(
            "rg2ft_proxi_offsets",
            &[
                Value::Int(state.left_proximity as i64),
                Value::Int(state.right_proximity as i64),
            ],
        )
    }

    // ==================== 状态 ====================

    pub fn state(&self) -> CommandResult<Rg2FtState> {
        self.handle.ensure_connected()?;
        self.read_state()
    }

    pub fn left_force_torque(&self) -> CommandResult<ForceTorque> {
        Ok(self.state()?.left_ft)
    }

    pub fn right_force_torque(&self) -> CommandResult<ForceTorque> {
        Ok(self.state()?.right_ft)
    }

    pub fn left_proximity(&self) -> CommandResult<f64> {
        Ok(self.state()?.left_proximity)
    }

    pub fn right_proximity(&self) -> CommandResult<f64> {
        Ok(self.state()?.right_proximity)
    }

    pub fn width(&self) -> CommandResult<f64> {
        Ok(self.state()?.width)
    }

    pub fn object_width(&self) -> CommandResult<f64> {
        Ok(self.state()?.object_width())
    }

    pub fn status(&self) -> CommandResult<i64> {
        Ok(self.state()?.status)
    }

    pub fn is_busy(&self) -> CommandResult<bool> {
        Ok(self.state()?.busy)
    }

    pub fn is_gripped(&self) -> CommandResult<bool> {
        Ok(self.state()?.grip_detected)
    }

    fn read_state(&self) -> CommandResult<Rg2FtState> {
        let vars = self.handle.read_value("rg2ft_get_all_variables")?;
        Rg2FtState::from_value(&vars)
    }
}
