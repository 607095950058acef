//! CPU throughput counters.
//!
//! The controller never owns the CPU model. It holds a read-only handle to a
//! [`ThroughputSource`] and samples it at epoch boundaries. [`CpuCounters`] is
//! a ready-made source a host (or a trace replayer) advances as it simulates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only source of committed-instruction and cycle counts.
pub trait ThroughputSource: Send + Sync {
    /// Total instructions committed so far.
    fn committed_instructions(&self) -> u64;

    /// Total CPU cycles elapsed so far.
    fn cycles(&self) -> u64;
}

/// A point-in-time reading of a [`ThroughputSource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Committed instructions at the time of the reading.
    pub instructions: u64,
    /// Cycles at the time of the reading.
    pub cycles: u64,
}

impl CounterSnapshot {
    /// Reads both counters from `source`.
    pub fn take(source: &dyn ThroughputSource) -> Self {
        Self {
            instructions: source.committed_instructions(),
            cycles: source.cycles(),
        }
    }
}

/// Shared counters advanced by the host simulator.
///
/// Shareable between the host's CPU model and any number of controllers.
/// All accesses are `Relaxed`: only the simulation thread advances them.
#[derive(Default)]
pub struct CpuCounters {
    instructions: AtomicU64,
    cycles: AtomicU64,
}

impl CpuCounters {
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds retired instructions and elapsed cycles.
    pub fn advance(&self, instructions: u64, cycles: u64) {
        let _ = self.instructions.fetch_add(instructions, Ordering::Relaxed);
        let _ = self.cycles.fetch_add(cycles, Ordering::Relaxed);
    }

    /// Overwrites both counters with absolute values.
    pub fn set(&self, instructions: u64, cycles: u64) {
        self.instructions.store(instructions, Ordering::Relaxed);
        self.cycles.store(cycles, Ordering::Relaxed);
    }
}

impl ThroughputSource for CpuCounters {
    fn committed_instructions(&self) -> u64 {
        self.instructions.load(Ordering::Relaxed)
    }

    fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for CpuCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuCounters")
            .field("instructions", &self.committed_instructions())
            .field("cycles", &self.cycles())
            .finish()
    }
}
