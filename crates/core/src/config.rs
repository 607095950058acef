//! Configuration for the prefetch controller.
//!
//! This module defines the construction parameters of a controller. It provides:
//! 1. **Defaults:** Baseline RL hyperparameters and child geometry.
//! 2. **Structures:** `ControllerConfig` and per-child `ChildConfig`.
//! 3. **Validation:** Fail-fast checks run before a controller is built.
//!
//! Configuration is supplied as JSON (CLI, Python bindings) or built in code
//! starting from `ControllerConfig::default()`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Epoch duration in simulated ticks.
    pub const TICKS_PER_EPOCH: u64 = 1_000_000;

    /// Q-value update step size.
    pub const LEARNING_RATE: f64 = 0.2;

    /// Probability of a uniformly random action at each boundary.
    pub const EXPLORE_RATE: f64 = 0.05;

    /// Multiplicative exploration decay per boundary (1.0 disables decay).
    pub const EXPLORE_DECAY: f64 = 1.0;

    /// Exploration floor applied while decaying.
    pub const EXPLORE_MIN: f64 = 0.0;

    /// Seed of the exploration RNG.
    pub const SEED: u64 = 0x5EED_CAFE;

    /// Emit a telemetry record every N epochs.
    pub const LOG_INTERVAL: u64 = 1;

    /// Telemetry CSV written when `debug_logging` is set and no path is given.
    pub const TRACE_FILE: &str = "rlpf_epochs.csv";

    /// Cache line size in bytes.
    pub const LINE_BYTES: usize = 64;

    /// Lines (or strides) prefetched per trigger.
    pub const DEGREE: usize = 1;

    /// Stride prefetcher RPT entries.
    pub const TABLE_SIZE: usize = 64;
}

/// Largest accepted prefetch degree.
pub const MAX_DEGREE: usize = 64;

/// Largest accepted stride RPT size.
pub const MAX_TABLE_SIZE: usize = 1 << 16;

/// Built-in child prefetch policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PrefetcherKind {
    /// Next-line prefetcher.
    NextLine,
    /// Stride prefetcher (reference prediction table).
    Stride,
    /// Stream prefetcher (ascending/descending line streams).
    Stream,
    /// Tagged prefetcher (miss- and prefetch-hit-triggered).
    Tagged,
}

impl fmt::Display for PrefetcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NextLine => "next_line",
            Self::Stride => "stride",
            Self::Stream => "stream",
            Self::Tagged => "tagged",
        };
        f.write_str(name)
    }
}

/// One child prefetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildConfig {
    /// Policy type.
    pub kind: PrefetcherKind,

    /// Cache line size in bytes
    #[serde(default = "ChildConfig::default_line")]
    pub line_bytes: usize,

    /// Prefetch degree (lines or strides per trigger)
    #[serde(default = "ChildConfig::default_degree")]
    pub degree: usize,

    /// RPT size (stride prefetcher only)
    #[serde(default = "ChildConfig::default_table_size")]
    pub table_size: usize,

    /// Diagnostic label; defaults to the kind name
    #[serde(default)]
    pub label: Option<String>,
}

impl ChildConfig {
    /// Creates a child of the given kind with default geometry.
    pub const fn new(kind: PrefetcherKind) -> Self {
        Self {
            kind,
            line_bytes: defaults::LINE_BYTES,
            degree: defaults::DEGREE,
            table_size: defaults::TABLE_SIZE,
            label: None,
        }
    }

    /// Sets the prefetch degree.
    #[must_use]
    pub const fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Label used in logs and in the Q-table children signature.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.kind.to_string())
    }

    /// Checks the geometry of the child at position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDegree`] or [`ConfigError::InvalidTableSize`].
    pub const fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.degree == 0 || self.degree > MAX_DEGREE {
            return Err(ConfigError::InvalidDegree {
                child: index,
                degree: self.degree,
                max: MAX_DEGREE,
            });
        }
        if !self.table_size.is_power_of_two() || self.table_size > MAX_TABLE_SIZE {
            return Err(ConfigError::InvalidTableSize {
                child: index,
                size: self.table_size,
                max: MAX_TABLE_SIZE,
            });
        }
        Ok(())
    }

    fn default_line() -> usize {
        defaults::LINE_BYTES
    }

    fn default_degree() -> usize {
        defaults::DEGREE
    }

    fn default_table_size() -> usize {
        defaults::TABLE_SIZE
    }
}

/// Root controller configuration.
///
/// # Examples
///
/// ```
/// use rlpf_core::config::{ControllerConfig, PrefetcherKind};
///
/// let json = r#"{
///     "cache_name": "system.l2cache",
///     "children": [
///         { "kind": "Stride", "degree": 2 },
///         { "kind": "Tagged" }
///     ],
///     "ticks_per_epoch": 5000000,
///     "learning_rate": 0.2,
///     "explore_rate": 0.05
/// }"#;
///
/// let config = ControllerConfig::from_json(json).unwrap();
/// assert_eq!(config.children.len(), 2);
/// assert_eq!(config.children[0].kind, PrefetcherKind::Stride);
/// assert_eq!(config.children[0].degree, 2);
/// assert_eq!(config.current_action, 0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Name of the owning cache (diagnostics and default Q-table file name)
    #[serde(default)]
    pub cache_name: String,

    /// Ordered child policies; indices are the RL actions
    #[serde(default)]
    pub children: Vec<ChildConfig>,

    /// Initial active action
    #[serde(default)]
    pub current_action: usize,

    /// Epoch length in simulated ticks
    #[serde(default = "ControllerConfig::default_ticks_per_epoch")]
    pub ticks_per_epoch: u64,

    /// Tick at which the first epoch starts (set when attaching mid-run)
    #[serde(default)]
    pub start_tick: u64,

    /// Q-value update step size in [0, 1]
    #[serde(default = "ControllerConfig::default_learning_rate")]
    pub learning_rate: f64,

    /// Exploration probability in [0, 1]
    #[serde(default = "ControllerConfig::default_explore_rate")]
    pub explore_rate: f64,

    /// Per-epoch multiplicative exploration decay in [0, 1]
    #[serde(default = "ControllerConfig::default_explore_decay")]
    pub explore_decay: f64,

    /// Exploration floor while decaying, in [0, 1]
    #[serde(default = "ControllerConfig::default_explore_min")]
    pub explore_min: f64,

    /// Exploration RNG seed
    #[serde(default = "ControllerConfig::default_seed")]
    pub seed: u64,

    /// Emit the per-epoch CSV trace
    #[serde(default)]
    pub debug_logging: bool,

    /// Path of the per-epoch CSV trace
    #[serde(default = "ControllerConfig::default_trace_file")]
    pub trace_file: PathBuf,

    /// Emit one trace record every N epochs
    #[serde(default = "ControllerConfig::default_log_interval")]
    pub log_interval: u64,

    /// Persisted Q-table; `None` disables load and save
    #[serde(default)]
    pub qtable_file: Option<PathBuf>,

    /// Save the Q-table every N epochs (0 = only on shutdown)
    #[serde(default)]
    pub save_interval_epochs: u64,
}

impl ControllerConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the document does not match the schema.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks every construction invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_for(self.children.len())
    }

    /// Same as [`ControllerConfig::validate`], but for a controller built
    /// with `children` externally constructed children instead of
    /// `self.children`.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate_for(&self, children: usize) -> Result<(), ConfigError> {
        if children == 0 {
            return Err(ConfigError::NoChildren);
        }
        if self.ticks_per_epoch == 0 {
            return Err(ConfigError::ZeroEpochLength);
        }
        if self.current_action >= children {
            return Err(ConfigError::InvalidInitialAction {
                action: self.current_action,
                children,
            });
        }
        check_rate("learning_rate", self.learning_rate)?;
        check_rate("explore_rate", self.explore_rate)?;
        check_rate("explore_decay", self.explore_decay)?;
        check_rate("explore_min", self.explore_min)?;
        if self.log_interval == 0 {
            return Err(ConfigError::ZeroLogInterval);
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate(i)?;
        }
        Ok(())
    }

    /// Derives the conventional Q-table file name for this cache:
    /// `qtable_<name>.bin` with every non-alphanumeric character replaced by `_`.
    pub fn derived_qtable_path(&self) -> PathBuf {
        let name = if self.cache_name.is_empty() {
            "controller"
        } else {
            self.cache_name.as_str()
        };
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        PathBuf::from(format!("qtable_{safe}.bin"))
    }

    fn default_ticks_per_epoch() -> u64 {
        defaults::TICKS_PER_EPOCH
    }

    fn default_learning_rate() -> f64 {
        defaults::LEARNING_RATE
    }

    fn default_explore_rate() -> f64 {
        defaults::EXPLORE_RATE
    }

    fn default_explore_decay() -> f64 {
        defaults::EXPLORE_DECAY
    }

    fn default_explore_min() -> f64 {
        defaults::EXPLORE_MIN
    }

    fn default_seed() -> u64 {
        defaults::SEED
    }

    fn default_trace_file() -> PathBuf {
        PathBuf::from(defaults::TRACE_FILE)
    }

    fn default_log_interval() -> u64 {
        defaults::LOG_INTERVAL
    }
}

impl Default for ControllerConfig {
    /// Stride + tagged children, starting on the stride prefetcher, no persistence.
    fn default() -> Self {
        Self {
            cache_name: String::new(),
            children: vec![
                ChildConfig::new(PrefetcherKind::Stride),
                ChildConfig::new(PrefetcherKind::Tagged),
            ],
            current_action: 0,
            ticks_per_epoch: defaults::TICKS_PER_EPOCH,
            start_tick: 0,
            learning_rate: defaults::LEARNING_RATE,
            explore_rate: defaults::EXPLORE_RATE,
            explore_decay: defaults::EXPLORE_DECAY,
            explore_min: defaults::EXPLORE_MIN,
            seed: defaults::SEED,
            debug_logging: false,
            trace_file: PathBuf::from(defaults::TRACE_FILE),
            log_interval: defaults::LOG_INTERVAL,
            qtable_file: None,
            save_interval_epochs: 0,
        }
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}
