//! Epsilon-greedy action selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Outcome of one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Chosen action index.
    pub action: usize,
    /// Whether the action was drawn at random.
    pub explored: bool,
}

/// Index of the largest value, lowest index on ties. Returns 0 for an empty row.
pub fn greedy(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = i;
        }
    }
    best
}

/// Seeded epsilon-greedy selector.
///
/// A zero exploration rate never touches the RNG, so greedy replays are
/// bit-identical regardless of seed.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    rng: StdRng,
    draws: u64,
}

impl EpsilonGreedy {
    /// Creates a selector with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Chooses an action for the given Q-row.
    ///
    /// # Arguments
    ///
    /// * `row` - Value estimates of the current state, one per action.
    /// * `explore_rate` - Probability of a uniformly random action.
    pub fn select(&mut self, row: &[f64], explore_rate: f64) -> Selection {
        if explore_rate > 0.0 && !row.is_empty() {
            self.draws += 1;
            if self.rng.random::<f64>() < explore_rate {
                self.draws += 1;
                return Selection {
                    action: self.rng.random_range(0..row.len()),
                    explored: true,
                };
            }
        }
        Selection {
            action: greedy(row),
            explored: false,
        }
    }

    /// Number of random numbers drawn so far.
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}
