//! Epoch scheduler.
//!
//! A tick-driven timer with two phases. While `tick < start + ticks_per_epoch`
//! the epoch is [`EpochPhase::Idle`]; once the boundary is reached a single
//! [`Boundary`] is reported and the next epoch starts at the observed tick.
//!
//! Exactly one boundary is reported per poll. If the host jumps across
//! several epoch lengths at once, the skipped windows collapse into the epoch
//! that ends at the observed tick. Ticks older than the newest tick seen are
//! ignored, so no window is processed twice.

/// Phase of the current epoch relative to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochPhase {
    /// Epoch in progress.
    Idle,
    /// Boundary reached; the next poll at this tick processes it.
    Boundary,
}

/// A processed epoch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Zero-based index of the epoch that just ended.
    pub epoch: u64,
    /// Tick at which that epoch started.
    pub started_at: u64,
    /// Tick at which it ended (the start of the next epoch).
    pub ended_at: u64,
}

/// Fixed-interval epoch timer.
#[derive(Debug, Clone)]
pub struct EpochScheduler {
    ticks_per_epoch: u64,
    epoch_start: u64,
    newest_tick: u64,
    completed: u64,
}

impl EpochScheduler {
    /// Creates a scheduler whose first epoch starts at `start_tick`.
    ///
    /// `ticks_per_epoch` is validated by the controller configuration; a zero
    /// length here is treated as one tick.
    pub fn new(ticks_per_epoch: u64, start_tick: u64) -> Self {
        Self {
            ticks_per_epoch: ticks_per_epoch.max(1),
            epoch_start: start_tick,
            newest_tick: start_tick,
            completed: 0,
        }
    }

    /// Phase of the current epoch at `tick`, without side effects.
    pub const fn phase(&self, tick: u64) -> EpochPhase {
        if tick >= self.newest_tick && tick.saturating_sub(self.epoch_start) >= self.ticks_per_epoch
        {
            EpochPhase::Boundary
        } else {
            EpochPhase::Idle
        }
    }

    /// Advances to `tick` and reports a boundary if one was reached.
    pub fn poll(&mut self, tick: u64) -> Option<Boundary> {
        if self.phase(tick) == EpochPhase::Idle {
            self.newest_tick = self.newest_tick.max(tick);
            return None;
        }

        let boundary = Boundary {
            epoch: self.completed,
            started_at: self.epoch_start,
            ended_at: tick,
        };
        self.completed += 1;
        self.epoch_start = tick;
        self.newest_tick = tick;
        Some(boundary)
    }

    /// Tick at which the current epoch started.
    pub const fn epoch_start(&self) -> u64 {
        self.epoch_start
    }

    /// Number of boundaries processed so far.
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    /// Configured epoch length.
    pub const fn ticks_per_epoch(&self) -> u64 {
        self.ticks_per_epoch
    }
}
