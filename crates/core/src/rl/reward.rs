//! Reward estimation.
//!
//! The reward of an epoch is the IPC it achieved, attributed to the action
//! that was active while it ran. Only counter snapshots go in; nothing is
//! mutated.

use crate::counters::CounterSnapshot;

/// Instructions per cycle between two snapshots.
///
/// Returns 0 for a degenerate epoch (no elapsed cycles) and when the counters
/// went backwards (host reset).
pub fn epoch_ipc(start: CounterSnapshot, end: CounterSnapshot) -> f64 {
    let cycles = end.cycles.saturating_sub(start.cycles);
    if cycles == 0 {
        return 0.0;
    }
    let instructions = end.instructions.saturating_sub(start.instructions);
    instructions as f64 / cycles as f64
}

/// Reward of the completed epoch.
pub fn reward(start: CounterSnapshot, end: CounterSnapshot) -> f64 {
    epoch_ipc(start, end)
}
