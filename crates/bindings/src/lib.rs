//! Python bindings for the adaptive prefetch controller.
//!
//! This crate exposes the controller to Python configuration scripts via PyO3. It provides:
//! 1. **Controller:** `PyPrefetchController`, built from a config dict, driven by `on_access` / `on_tick`.
//! 2. **Counters:** `PyCpuCounters`, the instruction/cycle source the host model advances.
//! 3. **Statistics:** `PyControllerStats` for per-action and per-child metrics.
//! 4. **Utilities:** Version string, logging setup and dict conversion helpers.

use pyo3::prelude::*;

/// Python dict to Rust `ControllerConfig` conversion.
pub mod conversion;
/// Controller binding (`PyPrefetchController`).
pub mod controller;
/// Counter binding (`PyCpuCounters`).
pub mod counters;
/// Statistics binding (`PyControllerStats`).
pub mod stats;
/// Utility functions (version, logging).
pub mod utils;

/// Registers all controller classes and functions onto the given Python module.
///
/// # Arguments
///
/// * `m` - The Python module to register types and functions on.
///
/// # Returns
///
/// `Ok(())` on success, or a `PyErr` if registration fails.
pub fn register_controller_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<controller::PyPrefetchController>()?;
    m.add_class::<counters::PyCpuCounters>()?;
    m.add_class::<stats::PyControllerStats>()?;

    m.add_function(wrap_pyfunction!(utils::version, m)?)?;
    m.add_function(wrap_pyfunction!(utils::init_logging, m)?)?;

    Ok(())
}

#[pymodule]
#[pyo3(name = "_core")]
fn rlpf_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register_controller_module(m)?;
    Ok(())
}
