//! # Reward Tests

use rlpf_core::counters::CounterSnapshot;
use rlpf_core::rl::reward::{epoch_ipc, reward};
use rstest::rstest;

fn snap(instructions: u64, cycles: u64) -> CounterSnapshot {
    CounterSnapshot {
        instructions,
        cycles,
    }
}

#[rstest]
#[case::ipc_one(snap(0, 0), snap(1000, 1000), 1.0)]
#[case::ipc_half(snap(100, 200), snap(600, 1200), 0.5)]
#[case::superscalar(snap(0, 0), snap(4000, 1000), 4.0)]
#[case::no_progress(snap(500, 800), snap(500, 800), 0.0)]
#[case::stalled_cycles_only(snap(10, 10), snap(10, 5010), 0.0)]
#[case::counters_reset(snap(900, 900), snap(10, 10), 0.0)]
fn test_reward(#[case] start: CounterSnapshot, #[case] end: CounterSnapshot, #[case] expected: f64) {
    assert_eq!(reward(start, end), expected);
    assert_eq!(epoch_ipc(start, end), expected);
}
