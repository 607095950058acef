//! Next-Line Prefetcher.
//!
//! Fetches the next sequential cache line(s) on every notification it
//! receives, regardless of hit or miss. The cheapest child and the usual
//! baseline arm for sequential phases.

use super::{Prefetcher, sanitize_line};
use crate::common::AccessInfo;
use crate::config::MAX_DEGREE;

/// Next-Line Prefetcher state.
#[derive(Debug)]
pub struct NextLinePrefetcher {
    /// Size of a cache line in bytes.
    line_bytes: u64,
    /// Number of subsequent lines to prefetch (prefetch degree).
    degree: usize,
}

impl NextLinePrefetcher {
    /// Creates a new Next-Line prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes (non powers of two fall back to 64).
    /// * `degree` - The number of lines to prefetch ahead (clamped to `1..=MAX_DEGREE`).
    pub fn new(line_bytes: usize, degree: usize) -> Self {
        Self {
            line_bytes: sanitize_line(line_bytes),
            degree: degree.clamp(1, MAX_DEGREE),
        }
    }
}

impl Prefetcher for NextLinePrefetcher {
    fn observe(&mut self, access: &AccessInfo) -> Vec<u64> {
        let base = access.addr & !(self.line_bytes - 1);
        (1..=self.degree as u64)
            .map(|k| base.wrapping_add(self.line_bytes.wrapping_mul(k)))
            .collect()
    }
}
