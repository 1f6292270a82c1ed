//! 工具槽位与数据记录
//!
//! 控制器以扁平字段表的形式返回复合数据，这里的类型负责与 [`Value`] 互转。

use crate::ProtocolError;
use crate::value::Value;

// ============================================================================
// 工具槽位
// ============================================================================

/// 工具安装位置
///
/// 单工具安装使用 `Single`，双快换盘（Dual Quick Changer）上的两个位置
/// 分别是 `DualPrimary` / `DualSecondary`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToolSlot {
    #[default]
    Single,
    DualPrimary,
    DualSecondary,
}

impl ToolSlot {
    pub const ALL: [ToolSlot; 3] = [
        ToolSlot::Single,
        ToolSlot::DualPrimary,
        ToolSlot::DualSecondary,
    ];

    /// 远程调用中的工具索引
    pub fn index(self) -> i64 {
        match self {
            ToolSlot::Single => 0,
            ToolSlot::DualPrimary => 1,
            ToolSlot::DualSecondary => 2,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(ToolSlot::Single),
            1 => Some(ToolSlot::DualPrimary),
            2 => Some(ToolSlot::DualSecondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolSlot::Single => write!(f, "single"),
            ToolSlot::DualPrimary => write!(f, "dual-primary"),
            ToolSlot::DualSecondary => write!(f, "dual-secondary"),
        }
    }
}

// ============================================================================
// 位姿
// ============================================================================

/// 笛卡尔位姿（mm / deg）
///
/// 全零位姿是控制器表示「没有有效位置」的哨兵值。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Pose {
    pub const ZERO: Pose = Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rx: 0.0,
        ry: 0.0,
        rz: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self {
            x,
            y,
            z,
            rx,
            ry,
            rz,
        }
    }

    /// 是否为「无有效位置」哨兵
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|v| *v == 0.0)
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
    }

    /// 编码为 `{x, y, z, rx, ry, rz}`
    pub fn to_value(&self) -> Value {
        self.to_value_with_keys(["x", "y", "z", "rx", "ry", "rz"])
    }

    /// 编码为 `{x, y, z, r1, r2, r3}`（Compute Box 位姿上报使用）
    pub fn to_cart_value(&self) -> Value {
        self.to_value_with_keys(["x", "y", "z", "r1", "r2", "r3"])
    }

    fn to_value_with_keys(&self, keys: [&str; 6]) -> Value {
        Value::structure(
            keys.into_iter()
                .zip(self.as_array())
                .map(|(k, v)| (k, Value::Double(v))),
        )
    }

    /// 从 `{x, y, z, rx, ry, rz}` 解码
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        Ok(Self {
            x: value.field("x")?.as_f64()?,
            y: value.field("y")?.as_f64()?,
            z: value.field("z")?.as_f64()?,
            rx: value.field("rx")?.as_f64()?,
            ry: value.field("ry")?.as_f64()?,
            rz: value.field("rz")?.as_f64()?,
        })
    }
}

/// 六轴关节位置（deg）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointPositions(pub [f64; 6]);

impl JointPositions {
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|v| Value::Double(*v)).collect())
    }
}

// ============================================================================
// 力 / 力矩
// ============================================================================

/// 六维力 / 力矩读数（N / Nm）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForceTorque {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
}

impl ForceTorque {
    pub fn from_array(ft: [f64; 6]) -> Self {
        let [fx, fy, fz, tx, ty, tz] = ft;
        Self {
            fx,
            fy,
            fz,
            tx,
            ty,
            tz,
        }
    }

    /// 从 `[Fx, Fy, Fz, Tx, Ty, Tz]` 数组解码
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        value.as_f64_array::<6>().map(Self::from_array)
    }
}
