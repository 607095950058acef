//! Stride Prefetcher.
//!
//! Detects constant stride patterns using a Reference Prediction Table (RPT).
//! Entries are indexed by the program counter when the notification carries
//! one, and by the line address otherwise.
//!
//! Prefetching starts only once the 2-bit confidence counter of an entry has
//! saturated and the observed stride matches again.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) per notification plus O(D) for D candidates.
//! - **Space Complexity:** O(T) where T is the table size (typically 64-256 entries).
//! - **Best Case:** Regular strided patterns (array traversals, matrix operations).
//! - **Worst Case:** Irregular or random access patterns (linked lists, hash tables).

use super::{Prefetcher, sanitize_line};
use crate::common::AccessInfo;
use crate::config::{MAX_DEGREE, MAX_TABLE_SIZE};

/// Entry in the Reference Prediction Table.
#[derive(Default, Clone, Copy, Debug)]
struct RptEntry {
    last_addr: u64,
    stride: i64,
    /// 2-bit saturating confidence.
    confidence: u8,
}

/// Stride Prefetcher state.
#[derive(Debug)]
pub struct StridePrefetcher {
    table: Vec<RptEntry>,
    line_bytes: u64,
    table_mask: usize,
    degree: usize,
}

impl StridePrefetcher {
    /// Creates a new Stride prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `table_size` - Number of RPT entries (a power of 2 up to `MAX_TABLE_SIZE`, otherwise 64).
    /// * `degree` - The number of strides to prefetch ahead.
    pub fn new(line_bytes: usize, table_size: usize, degree: usize) -> Self {
        let safe_size = if table_size.is_power_of_two() && table_size <= MAX_TABLE_SIZE {
            table_size
        } else {
            64
        };

        Self {
            table: vec![RptEntry::default(); safe_size],
            line_bytes: sanitize_line(line_bytes),
            table_mask: safe_size - 1,
            degree: degree.clamp(1, MAX_DEGREE),
        }
    }

    fn index(&self, access: &AccessInfo) -> usize {
        let key = access.pc.map_or(access.addr >> 6, |pc| pc >> 2);
        (key as usize) & self.table_mask
    }
}

impl Prefetcher for StridePrefetcher {
    fn observe(&mut self, access: &AccessInfo) -> Vec<u64> {
        let idx = self.index(access);
        let line_mask = !(self.line_bytes - 1);
        let degree = self.degree;
        let entry = &mut self.table[idx];

        let addr = access.addr;
        let current_stride = addr.wrapping_sub(entry.last_addr) as i64;
        let mut prefetches = Vec::new();

        if current_stride == entry.stride {
            if entry.confidence < 3 {
                entry.confidence += 1;
            } else {
                for k in 1..=degree as i64 {
                    let target = addr.wrapping_add(entry.stride.wrapping_mul(k) as u64);
                    prefetches.push(target & line_mask);
                }
            }
        } else if entry.confidence > 0 {
            entry.confidence -= 1;
        } else {
            entry.stride = current_stride;
        }

        entry.last_addr = addr;
        prefetches
    }
}
