//! 真空通道位掩码
//!
//! 多通道真空吸盘最多有 4 个通道（A/B/C/D）。抓取前需要先声明「参与抓取」
//! 和「需要监控超时」的通道集合，每个工具槽位各自保存一份。

use crate::error::{CommandError, CommandResult};
use onrobot_protocol::ToolSlot;
use parking_lot::Mutex;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// 单个真空通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::B, Channel::C, Channel::D];

    pub fn bit(self) -> u8 {
        match self {
            Channel::A => 0x01,
            Channel::B => 0x02,
            Channel::C => 0x04,
            Channel::D => 0x08,
        }
    }

    /// 小写字母（远程方法名后缀，如 `vgp_get_vacuum_a_percent`）
    pub fn suffix(self) -> &'static str {
        match self {
            Channel::A => "a",
            Channel::B => "b",
            Channel::C => "c",
            Channel::D => "d",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::A => "A",
            Channel::B => "B",
            Channel::C => "C",
            Channel::D => "D",
        };
        f.write_str(name)
    }
}

/// 通道集合（低 4 位有效）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const EMPTY: ChannelMask = ChannelMask(0x00);
    pub const A: ChannelMask = ChannelMask(0x01);
    pub const B: ChannelMask = ChannelMask(0x02);
    pub const C: ChannelMask = ChannelMask(0x04);
    pub const D: ChannelMask = ChannelMask(0x08);
    pub const ALL: ChannelMask = ChannelMask(0x0F);

    /// 由原始位构建，高 4 位非零时返回 `None`
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0 |= channel.bit();
    }

    pub fn union(self, other: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 | other.0)
    }

    /// 集合中的通道（A→D 顺序）
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        ChannelMask(channel.bit())
    }
}

impl FromIterator<Channel> for ChannelMask {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        let mut mask = ChannelMask::EMPTY;
        for channel in iter {
            mask.insert(channel);
        }
        mask
    }
}

impl BitOr for ChannelMask {
    type Output = ChannelMask;

    fn bitor(self, rhs: ChannelMask) -> ChannelMask {
        self.union(rhs)
    }
}

impl BitOrAssign for ChannelMask {
    fn bitor_assign(&mut self, rhs: ChannelMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for channel in self.channels() {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{}", channel)?;
            first = false;
        }
        Ok(())
    }
}

/// 每个工具槽位一份的通道掩码累加器
///
/// - 只给一个参数：覆盖已保存的掩码
/// - 给多个参数：按位或到已保存的掩码上
/// - 0 个或超过 4 个参数：用法错误，保存值不变
#[derive(Debug, Default)]
pub struct ChannelAccumulator {
    masks: Mutex<[ChannelMask; 3]>,
}

impl ChannelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按上述规则更新槽位掩码，返回更新后的值
    pub fn apply(
        &self,
        slot: ToolSlot,
        what: &'static str,
        args: &[ChannelMask],
    ) -> CommandResult<ChannelMask> {
        if args.is_empty() {
            return Err(CommandError::Usage(format!(
                "no channel given to set {what}"
            )));
        }
        if args.len() > 4 {
            return Err(CommandError::Usage(format!(
                "too many channel arguments to set {what}, max is 4"
            )));
        }

        let mut masks = self.masks.lock();
        let stored = &mut masks[slot_position(slot)];
        if let [single] = args {
            *stored = *single;
        } else {
            for mask in args {
                *stored |= *mask;
            }
        }
        Ok(*stored)
    }

    pub fn get(&self, slot: ToolSlot) -> ChannelMask {
        self.masks.lock()[slot_position(slot)]
    }
}

fn slot_position(slot: ToolSlot) -> usize {
    match slot {
        ToolSlot::Single => 0,
        ToolSlot::DualPrimary => 1,
        ToolSlot::DualSecondary => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bits_and_display() {
        let mask = ChannelMask::A | ChannelMask::C;
        assert_eq!(mask.bits(), 0x05);
        assert_eq!(mask.to_string(), "A|C");
        assert_eq!(mask.len(), 2);
        assert!(mask.contains(Channel::C));
        assert!(!mask.contains(Channel::B));
        assert_eq!(ChannelMask::EMPTY.to_string(), "none");
        assert_eq!(ChannelMask::ALL.channels().count(), 4);
        assert_eq!(ChannelMask::from_bits(0x10), None);
        assert_eq!(
            [Channel::B, Channel::D].into_iter().collect::<ChannelMask>(),
            ChannelMask::from_bits(0x0A).unwrap()
        );
    }

    #[test]
    fn test_single_argument_overwrites() {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::Single, "grip", &[ChannelMask::A, ChannelMask::B])
            .unwrap();
        let mask = acc.apply(ToolSlot::Single, "grip", &[ChannelMask::D]).unwrap();
        assert_eq!(mask, ChannelMask::D);
    }

    #[test]
    fn test_multiple_arguments_union_into_stored() {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::Single, "grip", &[ChannelMask::C]).unwrap();
        let mask = acc
            .apply(ToolSlot::Single, "grip", &[ChannelMask::A, ChannelMask::B])
            .unwrap();
        assert_eq!(mask.bits(), 0x07);
    }

    #[test]
    fn test_slots_are_independent() {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::DualPrimary, "grip", &[ChannelMask::ALL])
            .unwrap();
        assert_eq!(acc.get(ToolSlot::DualPrimary), ChannelMask::ALL);
        assert!(acc.get(ToolSlot::DualSecondary).is_empty());
        assert!(acc.get(ToolSlot::Single).is_empty());
    }

    #[test]
    fn test_argument_count_errors_leave_mask_unchanged() {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::Single, "timeout", &[ChannelMask::B])
            .unwrap();
        assert!(matches!(
            acc.apply(ToolSlot::Single, "timeout", &[]),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            acc.apply(ToolSlot::Single, "timeout", &[ChannelMask::A; 5]),
            Err(CommandError::Usage(_))
        ));
        assert_eq!(acc.get(ToolSlot::Single), ChannelMask::B);
    }
}
