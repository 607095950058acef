//! Tagged Prefetcher.
//!
//! Prefetches only on demand misses or when a previously prefetched line is
//! used, which keeps pollution low on hit-dominated phases.
//!
//! * **Miss:** assume a new stream and prefetch the next `degree` lines.
//! * **Hit on a tagged line:** the prefetch was useful, extend the stream.
//! * **Plain hit:** stay idle.

use super::{Prefetcher, sanitize_line};
use crate::common::AccessInfo;
use crate::config::MAX_DEGREE;

const FILTER_SIZE: usize = 64;

/// Tagged Prefetcher state.
#[derive(Debug)]
pub struct TaggedPrefetcher {
    line_bytes: u64,
    degree: usize,
    /// Direct-mapped record of issued lines, standing in for the per-line tag bit.
    prefetched_filter: Vec<Option<u64>>,
}

impl TaggedPrefetcher {
    /// Creates a new Tagged prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `degree` - The number of lines to prefetch ahead.
    pub fn new(line_bytes: usize, degree: usize) -> Self {
        Self {
            line_bytes: sanitize_line(line_bytes),
            degree: degree.clamp(1, MAX_DEGREE),
            prefetched_filter: vec![None; FILTER_SIZE],
        }
    }

    fn slot(&self, line: u64) -> usize {
        ((line / self.line_bytes) as usize) & (FILTER_SIZE - 1)
    }

    fn was_prefetched(&self, line: u64) -> bool {
        self.prefetched_filter[self.slot(line)] == Some(line)
    }

    fn mark_prefetched(&mut self, line: u64) {
        let slot = self.slot(line);
        self.prefetched_filter[slot] = Some(line);
    }
}

impl Prefetcher for TaggedPrefetcher {
    fn observe(&mut self, access: &AccessInfo) -> Vec<u64> {
        let line = access.addr & !(self.line_bytes - 1);

        if access.hit && !self.was_prefetched(line) {
            return Vec::new();
        }

        let mut prefetches = Vec::with_capacity(self.degree);
        for k in 1..=self.degree as u64 {
            let target = line.wrapping_add(self.line_bytes.wrapping_mul(k));
            prefetches.push(target);
            self.mark_prefetched(target);
        }
        prefetches
    }
}
