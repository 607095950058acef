//! Reinforcement-learning core.
//!
//! The controller learns a bandit-style value per (state, action):
//! 1. **State:** bucketed miss-rate and IPC history ([`state`]).
//! 2. **Reward:** IPC of the completed epoch ([`reward`]).
//! 3. **Update:** `Q += lr * (reward - Q)` on the cell that earned the reward ([`qtable`]).
//! 4. **Selection:** epsilon-greedy over the current state's row ([`selector`]).

/// Q-table store and file format.
pub mod qtable;

/// Reward estimator.
pub mod reward;

/// Epsilon-greedy selector.
pub mod selector;

/// State discretization.
pub mod state;

pub use qtable::{LoadOutcome, QTable};
pub use selector::{EpsilonGreedy, Selection};
pub use state::{EpochObservation, State, StateDiscretizer, StateFeatures};
