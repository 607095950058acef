//! Adaptive RL prefetch controller library.
//!
//! This crate implements a cache prefetch controller that learns which child prefetcher to run:
//! 1. **Children:** Next-line, stride, stream and tagged prefetch policies behind one trait.
//! 2. **Learning:** State discretization, IPC reward, bandit Q-table updates and epsilon-greedy selection.
//! 3. **Controller:** Tick-driven epochs, check-then-forward dispatch, telemetry and Q-table persistence.
//! 4. **Counters:** The read-only CPU throughput source the reward is computed from.
//! 5. **Statistics:** Per-action and per-child accounting.

/// Common types (access notifications, errors).
pub mod common;
/// Controller configuration (defaults, child kinds, validation).
pub mod config;
/// Epoch scheduling, dispatch and the controller itself.
pub mod controller;
/// CPU throughput counters sampled at epoch boundaries.
pub mod counters;
/// Child prefetch policies.
pub mod prefetch;
/// Q-table, reward, selection and state discretization.
pub mod rl;
/// Controller statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `ControllerConfig::default()` or deserialize from JSON.
pub use crate::config::ControllerConfig;
/// The controller; construct with `PrefetchController::new`.
pub use crate::controller::PrefetchController;
/// Shared counters a host advances as it simulates.
pub use crate::counters::{CpuCounters, ThroughputSource};
