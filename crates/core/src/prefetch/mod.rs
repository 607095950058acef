//! Child prefetch policies.
//!
//! The controller treats every child as an opaque [`Prefetcher`]: it accepts an
//! access notification and emits zero or more candidate addresses. Indices into
//! the controller's children list double as RL action identifiers.

/// Next-line prefetcher (prefetches sequential cache lines).
pub mod next_line;

/// Stream prefetcher (detects ascending/descending access streams).
pub mod stream;

/// Stride prefetcher (detects constant-stride access patterns).
pub mod stride;

/// Tagged prefetcher (prefetches on demand misses and prefetch hits).
pub mod tagged;

pub use self::next_line::NextLinePrefetcher;
pub use self::stream::StreamPrefetcher;
pub use self::stride::StridePrefetcher;
pub use self::tagged::TaggedPrefetcher;

use std::fmt;

use crate::common::AccessInfo;
use crate::config::{ChildConfig, PrefetcherKind};

/// Trait for child prefetch policies.
///
/// Implementations must not assume they see every access: the controller only
/// forwards notifications to the child that is currently active.
pub trait Prefetcher: Send + Sync {
    /// Observes a memory access and generates prefetch addresses.
    ///
    /// # Arguments
    ///
    /// * `access` - The access notification, exactly as the owning cache reported it.
    ///
    /// # Returns
    ///
    /// A vector of addresses to prefetch. Empty if no prefetches are needed.
    fn observe(&mut self, access: &AccessInfo) -> Vec<u64>;
}

/// A child policy together with the label used in diagnostics and in the
/// persisted Q-table signature.
pub struct Child {
    label: String,
    policy: Box<dyn Prefetcher>,
}

impl Child {
    /// Wraps a policy under the given label.
    pub fn new(label: impl Into<String>, policy: Box<dyn Prefetcher>) -> Self {
        Self {
            label: label.into(),
            policy,
        }
    }

    /// Label of this child (e.g. `"stride"`).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Forwards a notification to the wrapped policy.
    pub fn observe(&mut self, access: &AccessInfo) -> Vec<u64> {
        self.policy.observe(access)
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Builds a child from its configuration.
pub fn build_child(config: &ChildConfig) -> Child {
    let policy: Box<dyn Prefetcher> = match config.kind {
        PrefetcherKind::NextLine => Box::new(NextLinePrefetcher::new(
            config.line_bytes,
            config.degree,
        )),
        PrefetcherKind::Stride => Box::new(StridePrefetcher::new(
            config.line_bytes,
            config.table_size,
            config.degree,
        )),
        PrefetcherKind::Stream => Box::new(StreamPrefetcher::new(config.line_bytes, config.degree)),
        PrefetcherKind::Tagged => Box::new(TaggedPrefetcher::new(config.line_bytes, config.degree)),
    };
    Child::new(config.label(), policy)
}

/// Returns `line_bytes` if it is a non-zero power of two, otherwise 64.
pub(crate) const fn sanitize_line(line_bytes: usize) -> u64 {
    if line_bytes.is_power_of_two() {
        line_bytes as u64
    } else {
        64
    }
}
