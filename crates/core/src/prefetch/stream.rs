//! Stream Prefetcher.
//!
//! Locks onto contiguous forward or backward streams (stride of exactly +1 or
//! -1 cache lines). A 2-bit confidence counter must reach 2 before the stream
//! is followed `degree` lines ahead.
//!
//! The previous address is only updated on notifications this child receives,
//! so a benched stream prefetcher resumes from stale history and re-trains.

use super::{Prefetcher, sanitize_line};
use crate::common::AccessInfo;
use crate::config::MAX_DEGREE;

/// Direction of the memory stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    /// No stable direction detected.
    None,
    /// Ascending memory addresses.
    Ascending,
    /// Descending memory addresses.
    Descending,
}

/// Stream Prefetcher state.
#[derive(Debug)]
pub struct StreamPrefetcher {
    line_bytes: u64,
    degree: usize,
    last_line: u64,
    direction: Direction,
    confidence: u8,
}

impl StreamPrefetcher {
    /// Creates a new Stream prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `degree` - The number of lines to prefetch ahead.
    pub fn new(line_bytes: usize, degree: usize) -> Self {
        Self {
            line_bytes: sanitize_line(line_bytes),
            degree: degree.clamp(1, MAX_DEGREE),
            last_line: 0,
            direction: Direction::None,
            confidence: 0,
        }
    }

    fn classify(&self, line: u64) -> Direction {
        if line == self.last_line.wrapping_add(self.line_bytes) {
            Direction::Ascending
        } else if line == self.last_line.wrapping_sub(self.line_bytes) {
            Direction::Descending
        } else {
            Direction::None
        }
    }
}

impl Prefetcher for StreamPrefetcher {
    fn observe(&mut self, access: &AccessInfo) -> Vec<u64> {
        let line = access.addr & !(self.line_bytes - 1);
        let current = self.classify(line);

        if current == Direction::None {
            if self.confidence > 0 {
                self.confidence -= 1;
            } else {
                self.direction = Direction::None;
            }
        } else if current == self.direction {
            self.confidence = (self.confidence + 1).min(3);
        } else {
            self.direction = current;
            self.confidence = 1;
        }

        self.last_line = line;

        if self.confidence < 2 {
            return Vec::new();
        }

        (1..=self.degree as u64)
            .map(|k| match self.direction {
                Direction::Descending => line.wrapping_sub(k.wrapping_mul(self.line_bytes)),
                _ => line.wrapping_add(k.wrapping_mul(self.line_bytes)),
            })
            .collect()
    }
}
