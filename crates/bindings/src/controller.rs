//! Controller Python binding.
//!
//! Exposes the prefetch controller to Python: build from a config dict and a
//! counter object, feed access notifications and ticks, inspect the learned
//! table, and persist it on shutdown.

use std::sync::{Mutex, MutexGuard};

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rlpf_core::common::{AccessInfo, Requestor};
use rlpf_core::controller::{PrefetchController, TableOrigin};
use rlpf_core::rl::State;

use crate::conversion::{config_error, py_dict_to_config, qtable_error, report_to_dict};
use crate::counters::PyCpuCounters;
use crate::stats::PyControllerStats;

/// Python-exposed controller.
#[pyclass]
#[derive(Debug)]
pub struct PyPrefetchController {
    inner: Mutex<PrefetchController>,
}

impl PyPrefetchController {
    fn lock(&self) -> PyResult<MutexGuard<'_, PrefetchController>> {
        self.inner
            .lock()
            .map_err(|_| PyRuntimeError::new_err("controller state poisoned by an earlier panic"))
    }
}

#[pymethods]
impl PyPrefetchController {
    /// Creates a controller.
    ///
    /// # Arguments
    /// * `config_dict` - A dict matching `ControllerConfig` (children, rates, epoch length, ...).
    /// * `cpu` - The counters the host model advances; `None` is rejected.
    ///
    /// # Errors
    /// `ValueError` for an invalid config or a missing counter source.
    #[new]
    #[pyo3(signature = (config_dict, cpu=None))]
    fn new(py: Python<'_>, config_dict: &Bound<'_, PyAny>, cpu: Option<PyRef<'_, PyCpuCounters>>) -> PyResult<Self> {
        let config = py_dict_to_config(py, config_dict)?;
        let source = cpu.map(|c| c.source());
        let inner = PrefetchController::new(&config, source).map_err(config_error)?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Notifies the controller of one cache access.
    ///
    /// # Returns
    ///
    /// The prefetch candidate addresses of the active child.
    #[pyo3(signature = (tick, addr, hit, pc=None, requestor=0))]
    fn on_access(&self, tick: u64, addr: u64, hit: bool, pc: Option<u64>, requestor: u32) -> PyResult<Vec<u64>> {
        let mut access = AccessInfo::new(tick, addr, hit).with_requestor(Requestor(requestor));
        access.pc = pc;
        Ok(self.lock()?.on_access(&access))
    }

    /// Advances time without an access.
    ///
    /// # Returns
    ///
    /// The boundary report as a dict, or `None` if no epoch ended.
    fn on_tick(&self, py: Python<'_>, tick: u64) -> PyResult<Option<Py<PyDict>>> {
        let report = self.lock()?.on_tick(tick);
        report.map(|r| report_to_dict(py, &r)).transpose()
    }

    /// Report of the most recent boundary, if any.
    fn last_report(&self, py: Python<'_>) -> PyResult<Option<Py<PyDict>>> {
        let ctl = self.lock()?;
        ctl.last_report().map(|r| report_to_dict(py, r)).transpose()
    }

    #[getter]
    fn active_action(&self) -> PyResult<usize> {
        Ok(self.lock()?.active_action())
    }

    #[getter]
    fn active_label(&self) -> PyResult<String> {
        Ok(self.lock()?.active_label().to_owned())
    }

    #[getter]
    fn epochs(&self) -> PyResult<u64> {
        Ok(self.lock()?.epochs())
    }

    #[getter]
    fn explore_rate(&self) -> PyResult<f64> {
        Ok(self.lock()?.explore_rate())
    }

    #[getter]
    fn signature(&self) -> PyResult<String> {
        Ok(self.lock()?.signature().to_owned())
    }

    /// `"fresh"`, `"loaded"` or `"recovered: <reason>"`.
    #[getter]
    fn table_origin(&self) -> PyResult<String> {
        Ok(match self.lock()?.table_origin() {
            TableOrigin::Fresh => "fresh".to_owned(),
            TableOrigin::Loaded => "loaded".to_owned(),
            TableOrigin::Recovered(e) => format!("recovered: {e}"),
        })
    }

    /// Value estimates of `state`; zeros for states never seen.
    fn q_values(&self, state: u64) -> PyResult<Vec<f64>> {
        let ctl = self.lock()?;
        let table = ctl.qtable();
        Ok((0..table.actions()).map(|a| table.value(State(state), a)).collect())
    }

    /// Returns a snapshot of the controller statistics.
    fn get_stats(&self) -> PyResult<PyControllerStats> {
        Ok(PyControllerStats::from(self.lock()?.stats().clone()))
    }

    /// Writes the Q-table to the configured file (no-op without one).
    ///
    /// # Errors
    /// `IOError` if the file cannot be written.
    fn save_qtable(&self) -> PyResult<()> {
        self.lock()?.save_qtable().map_err(qtable_error)
    }

    /// Flushes the epoch trace and performs the final Q-table save.
    ///
    /// # Errors
    /// `IOError` if the file cannot be written.
    fn shutdown(&self) -> PyResult<()> {
        self.lock()?.shutdown().map_err(qtable_error)
    }

    fn __repr__(&self) -> PyResult<String> {
        let ctl = self.lock()?;
        Ok(format!(
            "PrefetchController(cache={:?}, children={:?}, active={}, epochs={})",
            ctl.name(),
            ctl.signature(),
            ctl.active_action(),
            ctl.epochs()
        ))
    }
}
