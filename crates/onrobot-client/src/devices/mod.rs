//! 各设备族的句柄
//!
//! 每个句柄包装一个 [`ActuatorHandle`](crate::handle::ActuatorHandle)，
//! 只负责本族的参数范围、启动命令和确认阶段。
//!
//! | 模块 | 设备 | 寻址 |
//! |------|------|------|
//! | `vg` | VG10 / VGC10 真空吸盘 | 槽位 |
//! | `rg` | RG2 / RG6 夹爪 | 槽位 |
//! | `three_fg` | 3FG15 / 3FG25 三指夹爪 | 槽位 |
//! | `two_fg` | 2FG7 / 2FG14 夹爪 | 槽位 |
//! | `fgp` | 2FGP20 夹爪 + 真空 | 槽位 |
//! | `sg` | SG 软体夹爪 | 槽位 |
//! | `mg` | MG10 磁力夹爪 | 槽位 |
//! | `vgp` | VGP20 电动真空 | 槽位 |
//! | `screwdriver` | 电动螺丝刀 | 槽位 |
//! | `sander` | 打磨机 | 固定索引 0 |
//! | `hex` | HEX 力/力矩传感器 | 固定索引 -1 |
//! | `rg2ft` | RG2-FT 夹爪 | 固定索引 -1 |
//! | `lift` | LIFT100 升降柱 | 固定索引 100 |
//! | `eyes` | Eyes 视觉 | 控制器 |
//! | `compute_box` | Compute Box I/O | 控制器 |
//! | `weblytics` | WebLytics 上报 | 控制器 |

pub mod compute_box;
pub mod eyes;
pub mod fgp;
pub mod hex;
pub mod lift;
pub mod mg;
pub mod rg;
pub mod rg2ft;
pub mod sander;
pub mod screwdriver;
pub mod sg;
pub mod three_fg;
pub mod two_fg;
pub mod vg;
pub mod vgp;
pub mod weblytics;

pub use compute_box::{COMPUTE_BOX_FAMILY, ComputeBox};
pub use eyes::{EYES_FAMILY, Eyes, InspectionResult};
pub use fgp::{FGP_FAMILY, Fgp, Finger};
pub use hex::{HEX_FAMILY, Hex};
pub use lift::{LIFT_FAMILY, Lift};
pub use mg::{MG_FAMILY, Mg};
pub use rg::{RG_FAMILY, Rg, RgLimits};
pub use rg2ft::{RG2FT_FAMILY, Rg2Ft, Rg2FtState};
pub use sander::{SANDER_FAMILY, Sander};
pub use screwdriver::{
    CommandResultCode, InitError, SCREWDRIVER_FAMILY, Screwdriver, ScrewdriverFault,
};
pub use sg::{OpenLimits, SG_FAMILY, Sg, SgTool};
pub use three_fg::{GripDirection, THREE_FG_FAMILY, ThreeFg};
pub use two_fg::{TWO_FG_FAMILY, TwoFg};
pub use vg::{VG_FAMILY, Vg};
pub use vgp::{VGP_FAMILY, Vgp, VgpChannels, VgpGripStatus, VgpReleaseStatus};
pub use weblytics::{WEBLYTICS_FAMILY, Weblytics};
