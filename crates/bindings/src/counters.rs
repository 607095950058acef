//! CPU counter Python binding.
//!
//! The Python-side CPU model advances these counters; every controller built
//! with them samples the same values at its epoch boundaries.

use std::sync::Arc;

use pyo3::prelude::*;
use rlpf_core::counters::{CpuCounters, ThroughputSource};

/// Python-exposed shared instruction/cycle counters.
#[pyclass]
#[derive(Debug, Clone, Default)]
pub struct PyCpuCounters {
    pub inner: Arc<CpuCounters>,
}

#[pymethods]
impl PyCpuCounters {
    /// Creates counters starting at zero.
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Adds retired instructions and elapsed cycles.
    fn advance(&self, instructions: u64, cycles: u64) {
        self.inner.advance(instructions, cycles);
    }

    /// Overwrites both counters with absolute values.
    fn set(&self, instructions: u64, cycles: u64) {
        self.inner.set(instructions, cycles);
    }

    #[getter]
    fn instructions(&self) -> u64 {
        self.inner.committed_instructions()
    }

    #[getter]
    fn cycles(&self) -> u64 {
        self.inner.cycles()
    }

    fn __repr__(&self) -> String {
        format!(
            "CpuCounters(instructions={}, cycles={})",
            self.inner.committed_instructions(),
            self.inner.cycles()
        )
    }
}

impl PyCpuCounters {
    /// The counters as a controller throughput source.
    pub fn source(&self) -> Arc<dyn ThroughputSource> {
        self.inner.clone()
    }
}
