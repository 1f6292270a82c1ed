//! 设备标识与协议常量
//!
//! 设备标识是控制器在 `cb_is_device_connected(index, id)` 中使用的数值标签，
//! 必须与固件逐位一致。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 控制器 XML-RPC 服务默认端口
pub const DEFAULT_PORT: u16 = 41414;

/// 默认控制器地址
pub const DEFAULT_CONTROLLER_IP: &str = "192.168.1.1";

/// 向控制器上报的机器人类型（Doosan）
pub const ROBOT_TYPE_DOOSAN: i64 = 8;

/// HEX / RG2-FT 使用的固定远程索引
pub const HEX_INDEX: i64 = -1;

/// 升降柱使用的固定远程索引
pub const LIFT_INDEX: i64 = 100;

/// 打磨机使用的固定远程索引
pub const SANDER_INDEX: i64 = 0;

/// 远程调用返回码：成功
pub const RET_OK: i64 = 0;

/// 远程调用返回码：失败
pub const RET_FAIL: i64 = -1;

/// 设备标识
///
/// 同一个句柄可能接受多个标识（VG10/VGC10、RG2/RG6、HEXv2/HEXv3），
/// 具体见各设备族的描述符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum DeviceIdentity {
    /// 真空吸盘 VG10
    Vg10 = 0x10,
    /// 真空吸盘 VGC10
    Vgc10 = 0x11,
    /// 多通道真空吸盘 VGP
    Vgp = 0x18,
    /// 二指夹爪 RG2
    Rg2 = 0x20,
    /// 二指夹爪 RG6
    Rg6 = 0x21,
    /// 带力传感器的 RG2-FT
    Rg2Ft = 0x22,
    /// 六维力传感器 HEX v3
    HexV3 = 0x40,
    /// 六维力传感器 HEX v2
    HexV2 = 0x42,
    /// 软体夹爪 SG
    Sg = 0x50,
    /// 三指夹爪 3FG
    ThreeFg = 0x70,
    /// 电动螺丝刀 SD
    Screwdriver = 0x80,
    /// 磁力夹爪 MG
    Mg = 0xA0,
    /// 打磨机 Sander
    Sander = 0xB0,
    /// 二指夹爪 2FG
    TwoFg = 0xC0,
    /// 二指夹爪 + 真空 2FGP20
    TwoFgp20 = 0xF0,
    /// 升降柱 LIFT
    Lift = 0x100,
}

impl DeviceIdentity {
    /// 线上数值
    pub fn code(self) -> i64 {
        i64::from(u16::from(self))
    }

    /// 由线上数值解析
    pub fn from_code(code: i64) -> Result<Self, crate::ProtocolError> {
        u16::try_from(code)
            .ok()
            .and_then(|c| Self::try_from(c).ok())
            .ok_or(crate::ProtocolError::UnknownIdentity(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_codes_bit_exact() {
        let table = [
            (DeviceIdentity::Vg10, 0x10),
            (DeviceIdentity::Vgc10, 0x11),
            (DeviceIdentity::Vgp, 0x18),
            (DeviceIdentity::Rg2, 0x20),
            (DeviceIdentity::Rg6, 0x21),
            (DeviceIdentity::Rg2Ft, 0x22),
            (DeviceIdentity::HexV3, 0x40),
            (DeviceIdentity::HexV2, 0x42),
            (DeviceIdentity::Sg, 0x50),
            (DeviceIdentity::ThreeFg, 0x70),
            (DeviceIdentity::Screwdriver, 0x80),
            (DeviceIdentity::Mg, 0xA0),
            (DeviceIdentity::Sander, 0xB0),
            (DeviceIdentity::TwoFg, 0xC0),
            (DeviceIdentity::TwoFgp20, 0xF0),
            (DeviceIdentity::Lift, 0x100),
        ];
        for (id, code) in table {
            assert_eq!(id.code(), code, "{:?}", id);
            assert_eq!(DeviceIdentity::from_code(code).unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_identity() {
        assert_eq!(
            DeviceIdentity::from_code(0x99),
            Err(crate::ProtocolError::UnknownIdentity(0x99))
        );
        assert!(DeviceIdentity::from_code(-1).is_err());
        assert!(DeviceIdentity::from_code(1 << 20).is_err());
    }
}
