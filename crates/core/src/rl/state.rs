//! State discretization.
//!
//! Each epoch boundary folds the completed epoch's miss rate and IPC into a
//! small history and buckets three features of it:
//!
//! | Feature | Bins | Thresholds |
//! |---|---|---|
//! | change of the smoothed miss rate | 5 | ±0.10, ±0.02 |
//! | change of IPC | 3 | ±1e-4 |
//! | miss-rate improvement ("accuracy") | 3 | 0.2, 0.6 |
//!
//! The code is `accuracy * 100 + miss * 10 + ipc`, which bounds the space at
//! 45 codes. Accuracy is derived from the same smoothed miss-rate change as the
//! miss bin, so only 7 (accuracy, miss) pairs can occur and at most 21 codes
//! are reachable: see [`REACHABLE_ACC_MISS`]. The mapping depends only on the
//! observed counter history.

use std::fmt;

use serde::{Deserialize, Serialize};

/// EMA weight of the newest miss rate.
const MISS_SMOOTH_ALPHA: f64 = 0.3;

/// Largest miss-rate improvement (either sign) distinguished by the accuracy feature.
const ACC_MAX_SPAN: f64 = 0.2;

/// `(accuracy_bin, miss_bin)` pairs the discretizer can produce.
pub const REACHABLE_ACC_MISS: [(u8, u8); 7] =
    [(2, 0), (2, 1), (1, 1), (1, 2), (1, 3), (1, 4), (0, 4)];

/// A discretized Q-table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub u64);

impl State {
    /// State used before the first epoch completes.
    pub const INITIAL: Self = Self(0);

    /// Packs the three bins into a state code.
    pub const fn encode(accuracy_bin: u8, miss_bin: u8, ipc_bin: u8) -> Self {
        Self(accuracy_bin as u64 * 100 + miss_bin as u64 * 10 + ipc_bin as u64)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw measurements of one completed epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochObservation {
    /// Access notifications seen during the epoch.
    pub accesses: u64,
    /// Notifications that missed in the owning cache.
    pub misses: u64,
    /// Instructions per cycle over the epoch.
    pub ipc: f64,
}

impl EpochObservation {
    /// Miss rate of the epoch; 0 when no access was seen.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }
}

/// Features derived for one boundary, with the resulting state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateFeatures {
    /// Raw miss rate of the completed epoch.
    pub miss_rate: f64,
    /// Change of the smoothed miss rate.
    pub delta_miss: f64,
    /// Change of IPC relative to the previous epoch.
    pub delta_ipc: f64,
    /// Normalized miss-rate improvement in `[0, 1]`.
    pub accuracy: f64,
    /// Encoded state.
    pub state: State,
}

/// Buckets a change of the smoothed miss rate.
pub fn miss_bin(delta: f64) -> u8 {
    if delta < -0.10 {
        0
    } else if delta < -0.02 {
        1
    } else if delta < 0.02 {
        2
    } else if delta < 0.10 {
        3
    } else {
        4
    }
}

/// Buckets a change of IPC.
pub fn ipc_bin(delta: f64) -> u8 {
    if delta < -1e-4 {
        0
    } else if delta < 1e-4 {
        1
    } else {
        2
    }
}

/// Buckets an accuracy value in `[0, 1]`.
pub fn accuracy_bin(accuracy: f64) -> u8 {
    if accuracy <= 0.20 {
        0
    } else if accuracy <= 0.60 {
        1
    } else {
        2
    }
}

/// Running history needed to derive the next state.
#[derive(Debug, Clone, Default)]
pub struct StateDiscretizer {
    smoothed_miss: Option<f64>,
    last_ipc: f64,
}

impl StateDiscretizer {
    /// Creates a discretizer with empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a completed epoch into the history and returns the state for the
    /// epoch that starts now.
    pub fn observe(&mut self, obs: &EpochObservation) -> StateFeatures {
        let miss_rate = obs.miss_rate();

        let (previous, smoothed) = match self.smoothed_miss {
            None => (miss_rate, miss_rate),
            Some(prev) => (
                prev,
                MISS_SMOOTH_ALPHA.mul_add(miss_rate, (1.0 - MISS_SMOOTH_ALPHA) * prev),
            ),
        };
        self.smoothed_miss = Some(smoothed);
        let delta_miss = smoothed - previous;

        let improvement = (previous - smoothed).clamp(-ACC_MAX_SPAN, ACC_MAX_SPAN);
        let accuracy = (improvement + ACC_MAX_SPAN) / (2.0 * ACC_MAX_SPAN);

        let delta_ipc = if obs.ipc.is_finite() {
            obs.ipc - self.last_ipc
        } else {
            0.0
        };
        if obs.ipc.is_finite() {
            self.last_ipc = obs.ipc;
        }

        StateFeatures {
            miss_rate,
            delta_miss,
            delta_ipc,
            accuracy,
            state: State::encode(
                accuracy_bin(accuracy),
                miss_bin(delta_miss),
                ipc_bin(delta_ipc),
            ),
        }
    }
}
