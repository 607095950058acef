//! Error types for controller construction and Q-table persistence.
//!
//! Two families exist:
//! 1. **Configuration errors:** fatal, returned from controller construction.
//! 2. **Q-table errors:** recoverable, reported when a persisted table cannot be
//!    read or written. Loading falls back to a zero table; saving never aborts a run.

use thiserror::Error;

/// Invalid controller configuration. Construction fails fast on any of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The children list is empty, so there is no action to choose.
    #[error("controller needs at least one child prefetcher")]
    NoChildren,

    /// `ticks_per_epoch` must be strictly positive.
    #[error("ticks_per_epoch must be > 0")]
    ZeroEpochLength,

    /// The initial action does not index into the children list.
    #[error("initial action {action} out of range for {children} children")]
    InvalidInitialAction {
        /// Requested initial action.
        action: usize,
        /// Number of configured children.
        children: usize,
    },

    /// A rate parameter lies outside `[0, 1]` or is NaN.
    #[error("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// No instruction/cycle counter source was supplied, so rewards cannot be computed.
    #[error("no CPU counter source supplied; IPC reward cannot be computed")]
    MissingCpu,

    /// `log_interval` must be strictly positive.
    #[error("log_interval must be > 0")]
    ZeroLogInterval,

    /// A child's prefetch degree is zero or above the supported maximum.
    #[error("child {child}: degree must lie in [1, {max}], got {degree}")]
    InvalidDegree {
        /// Index of the offending child.
        child: usize,
        /// Configured degree.
        degree: usize,
        /// Largest accepted degree.
        max: usize,
    },

    /// A child's table size is zero, not a power of two or above the supported maximum.
    #[error("child {child}: table_size must be a power of two in [1, {max}], got {size}")]
    InvalidTableSize {
        /// Index of the offending child.
        child: usize,
        /// Configured table size.
        size: usize,
        /// Largest accepted table size.
        max: usize,
    },
}

/// Failure to read or write a persisted Q-table.
#[derive(Debug, Error)]
pub enum QTableError {
    /// Underlying file I/O failed.
    #[error("q-table I/O: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the Q-table magic.
    #[error("not a q-table file (bad magic)")]
    BadMagic,

    /// The file was written by an unknown format version.
    #[error("unsupported q-table format version {0}")]
    UnsupportedVersion(u32),

    /// The recorded action count differs from the number of children.
    #[error("q-table records {found} actions, controller has {expected}")]
    ActionCountMismatch {
        /// Number of actions the controller expects.
        expected: usize,
        /// Number of actions recorded in the file.
        found: usize,
    },

    /// The recorded children signature differs from the configured children.
    #[error("q-table children signature mismatch (saved `{found}`, current `{expected}`)")]
    SignatureMismatch {
        /// Signature of the configured children.
        expected: String,
        /// Signature recorded in the file.
        found: String,
    },

    /// The file ended before the named field could be read.
    #[error("q-table truncated while reading {0}")]
    Truncated(&'static str),

    /// Bytes remain after the last declared row.
    #[error("q-table has {0} trailing bytes")]
    TrailingBytes(usize),

    /// The children signature is not valid UTF-8.
    #[error("q-table signature is not valid UTF-8")]
    InvalidSignature,

    /// An update addressed an action the table does not have.
    #[error("action {action} out of range for a {actions}-action table")]
    ActionOutOfRange {
        /// Requested action.
        action: usize,
        /// Actions per row.
        actions: usize,
    },

    /// A stored or computed value is NaN or infinite.
    #[error("q-table value for state {state} action {action} is not finite")]
    NonFinite {
        /// State code of the offending row.
        state: u64,
        /// Action index of the offending cell.
        action: usize,
    },
}
