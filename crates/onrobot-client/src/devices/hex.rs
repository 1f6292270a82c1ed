//! HEX 六维力 / 力矩传感器
//!
//! 固定索引 -1，远程调用本身不带索引。

use crate::engine::Sleeper;
use crate::error::CommandResult;
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{DeviceIdentity, ForceTorque, HEX_INDEX, ToolSlot, Value};
use std::sync::Arc;

pub static HEX_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "HEX",
    identities: &[DeviceIdentity::HexV2, DeviceIdentity::HexV3],
    addressing: Addressing::Fixed {
        index: HEX_INDEX,
        in_calls: false,
    },
    presence: Presence::Device,
};

/// HEX 句柄
#[derive(Debug, Clone)]
pub struct Hex {
    handle: ActuatorHandle,
}

impl Hex {
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &HEX_FAMILY,
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

    pub fn is_v2(&self) -> CommandResult<bool> {
        self.is_identity(DeviceIdentity::HexV2)
    }

    pub fn is_v3(&self) -> CommandResult<bool> {
        self.is_identity(DeviceIdentity::HexV3)
    }

    fn is_identity(&self, identity: DeviceIdentity) -> CommandResult<bool> {
        self.handle.ensure_connected()?;
        Ok(self
            .handle
            .raw_call(
                "cb_is_device_connected",
                &[Value::Int(HEX_INDEX), Value::Int(identity.code())],
            )?
            .as_bool()?)
    }

    /// 当前力 / 力矩读数
    pub fn force_torque(&self) -> CommandResult<ForceTorque> {
        self.handle.ensure_connected()?;
        let vars = self.handle.read_value("hex_get_all_variables")?;
        Ok(ForceTorque::from_value(vars.field("ft")?)?)
    }

    pub fn status(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        let vars = self.handle.read_value("hex_get_all_variables")?;
        Ok(vars.field("status")?.as_i64()?)
    }

    /// 以当前读数作为零点
    pub fn zero(&self) -> CommandResult<()> {
        self.bias(true)
    }

    /// 清除零点偏置
    pub fn unzero(&self) -> CommandResult<()> {
        self.bias(false)
    }

    fn bias(&self, enable: bool) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle.command("ft_bias", &[Value::Bool(enable)])
    }
}
