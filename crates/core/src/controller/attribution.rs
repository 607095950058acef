//! Per-child prefetch attribution.
//!
//! Remembers which child issued each outstanding prefetch line so later
//! demand hits can be credited to it. The table is bounded and is cleared
//! wholesale when full.

use std::collections::HashMap;

/// Outstanding lines tracked before the table is cleared.
pub const MAX_TRACKED_PREFETCHES: usize = 2048;

/// Granularity at which issues and hits are matched.
pub const TRACK_LINE_BYTES: u64 = 64;

/// Classification of an issued candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// First time the line is tracked.
    Fresh,
    /// The line was already outstanding; ownership moves to the new issuer.
    Redundant,
}

/// Address-to-child ownership table.
#[derive(Debug, Clone)]
pub struct PrefetchAttribution {
    owners: HashMap<u64, usize>,
    capacity: usize,
}

impl Default for PrefetchAttribution {
    fn default() -> Self {
        Self::new(MAX_TRACKED_PREFETCHES)
    }
}

impl PrefetchAttribution {
    /// Creates a table holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            owners: HashMap::with_capacity(capacity.min(MAX_TRACKED_PREFETCHES)),
            capacity: capacity.max(1),
        }
    }

    const fn line(addr: u64) -> u64 {
        addr & !(TRACK_LINE_BYTES - 1)
    }

    /// Records that `child` issued a prefetch for `addr`.
    pub fn record_issue(&mut self, child: usize, addr: u64) -> IssueOutcome {
        let line = Self::line(addr);
        if let Some(owner) = self.owners.get_mut(&line) {
            *owner = child;
            return IssueOutcome::Redundant;
        }
        if self.owners.len() >= self.capacity {
            self.owners.clear();
        }
        let _ = self.owners.insert(line, child);
        IssueOutcome::Fresh
    }

    /// Credits a demand hit on `addr`, returning the child that prefetched it.
    /// The line stops being tracked so it is never credited twice.
    pub fn record_hit(&mut self, addr: u64) -> Option<usize> {
        self.owners.remove(&Self::line(addr))
    }

    /// Number of lines currently tracked.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no line is tracked.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
