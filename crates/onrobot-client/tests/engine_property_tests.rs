//! 确认引擎与通道掩码的属性测试

use onrobot_client::{
    Channel, ChannelAccumulator, ChannelMask, CommandOutcome, CommandPhase, ConfirmationEngine,
    DEFAULT_POLL_INTERVAL, PhaseId, PhaseKind, VirtualSleeper,
};
use onrobot_protocol::ToolSlot;
use proptest::prelude::*;
use std::cell::Cell;
use std::sync::Arc;

/// (轮询预算, 第几次满足；0 表示从不满足)
fn phase_specs() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0u32..25, 0u32..30), 1..5)
}

fn mask() -> impl Strategy<Value = ChannelMask> {
    (1u8..=0x0F).prop_map(|bits| ChannelMask::from_bits(bits).unwrap())
}

proptest! {
    /// 轮询次数、睡眠次数与超时阶段符合计数规则
    #[test]
    fn poll_accounting(specs in phase_specs()) {
        let sleeper = Arc::new(VirtualSleeper::new());
        let engine = ConfirmationEngine::new(sleeper.clone());
        let counters: Vec<Cell<u32>> = specs.iter().map(|_| Cell::new(0)).collect();

        let phases = specs
            .iter()
            .zip(&counters)
            .map(|(&(budget, success_at), counter)| {
                CommandPhase::new(PhaseKind::Busy, budget, move || {
                    counter.set(counter.get() + 1);
                    Ok(success_at != 0 && counter.get() >= success_at)
                })
            })
            .collect();
        let result = engine.confirm(phases, true).unwrap();

        let mut expected_polls = 0;
        let mut expected_sleeps = 0;
        let mut expected_outcome = CommandOutcome::Confirmed;
        for (index, &(budget, success_at)) in specs.iter().enumerate() {
            let budget = budget.max(1);
            let satisfied = success_at != 0 && success_at <= budget;
            let polls = if satisfied { success_at } else { budget };
            expected_polls += polls;
            expected_sleeps += polls - 1;
            prop_assert_eq!(counters[index].get(), polls);
            if !satisfied {
                expected_outcome = CommandOutcome::TimedOut(PhaseId::new(index, PhaseKind::Busy));
                // 后续阶段从未被轮询
                for later in &counters[index + 1..] {
                    prop_assert_eq!(later.get(), 0);
                }
                break;
            }
        }

        prop_assert_eq!(result.outcome, expected_outcome);
        prop_assert_eq!(result.polls, expected_polls);
        prop_assert_eq!(sleeper.sleeps() as u32, expected_sleeps);
        prop_assert_eq!(sleeper.elapsed(), DEFAULT_POLL_INTERVAL * expected_sleeps);
    }

    /// 不等待时不做任何轮询
    #[test]
    fn no_wait_never_polls(specs in phase_specs()) {
        let sleeper = Arc::new(VirtualSleeper::new());
        let engine = ConfirmationEngine::new(sleeper.clone());
        let polled = Cell::new(0u32);
        let phases = specs
            .iter()
            .map(|&(budget, _)| {
                CommandPhase::new(PhaseKind::GripDetected, budget, || {
                    polled.set(polled.get() + 1);
                    Ok(false)
                })
            })
            .collect();
        let result = engine.confirm(phases, false).unwrap();
        prop_assert!(result.is_confirmed());
        prop_assert_eq!(result.polls, 0);
        prop_assert_eq!(polled.get(), 0);
        prop_assert_eq!(sleeper.sleeps(), 0);
    }

    /// 单个参数覆盖，多个参数按位或
    #[test]
    fn accumulator_rules(initial in mask(), args in prop::collection::vec(mask(), 1..=4)) {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::DualPrimary, "grip", &[initial]).unwrap();

        let stored = acc.apply(ToolSlot::DualPrimary, "grip", &args).unwrap();
        let expected = if args.len() == 1 {
            args[0]
        } else {
            args.iter().fold(initial, |acc, m| acc | *m)
        };
        prop_assert_eq!(stored, expected);
        prop_assert_eq!(acc.get(ToolSlot::DualPrimary), expected);
        // 其他槽位不受影响
        prop_assert_eq!(acc.get(ToolSlot::DualSecondary), ChannelMask::EMPTY);
    }

    /// 非法参数个数不改变保存值
    #[test]
    fn accumulator_rejects_bad_arity(initial in mask(), args in prop::collection::vec(mask(), 5..8)) {
        let acc = ChannelAccumulator::new();
        acc.apply(ToolSlot::Single, "timeout", &[initial]).unwrap();
        prop_assert!(acc.apply(ToolSlot::Single, "timeout", &args).is_err());
        prop_assert!(acc.apply(ToolSlot::Single, "timeout", &[]).is_err());
        prop_assert_eq!(acc.get(ToolSlot::Single), initial);
    }

    /// 掩码的通道迭代与位表示一致
    #[test]
    fn mask_channels_match_bits(m in mask()) {
        let rebuilt: ChannelMask = m.channels().collect();
        prop_assert_eq!(rebuilt, m);
        prop_assert_eq!(m.len(), Channel::ALL.iter().filter(|c| m.contains(**c)).count());
    }
}
