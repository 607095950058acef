//! Statistics Python binding.
//!
//! Exposes controller statistics to Python: getters for epochs, accesses and
//! misses; `print` / `print_sections` for human-readable output; `to_dict`
//! for JSON-serializable export.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use rlpf_core::stats::ControllerStats;

/// Python-exposed statistics: wraps `ControllerStats` for read and print from Python.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyControllerStats {
    pub inner: ControllerStats,
}

#[pymethods]
impl PyControllerStats {
    #[getter]
    fn epochs(&self) -> u64 {
        self.inner.epochs
    }

    #[getter]
    fn accesses(&self) -> u64 {
        self.inner.accesses
    }

    #[getter]
    fn misses(&self) -> u64 {
        self.inner.misses
    }

    #[getter]
    fn explored(&self) -> u64 {
        self.inner.explored
    }

    #[getter]
    fn miss_rate(&self) -> f64 {
        self.inner.miss_rate()
    }

    #[getter]
    fn action_use(&self) -> Vec<u64> {
        self.inner.action_use.clone()
    }

    /// Print all stats (full dump).
    fn print(&self) {
        self.inner.print();
    }

    /// Print only the given sections. Options: "summary", "actions", "children".
    /// Pass an empty list for the full dump.
    fn print_sections(&self, sections: Vec<String>) {
        self.inner.print_sections(&sections);
    }

    /// Export all stats as a dict; children become a list of dicts.
    fn to_dict(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let s = &self.inner;
        let d = PyDict::new(py);
        d.set_item("epochs", s.epochs)?;
        d.set_item("accesses", s.accesses)?;
        d.set_item("misses", s.misses)?;
        d.set_item("miss_rate", s.miss_rate())?;
        d.set_item("explored", s.explored)?;
        d.set_item("action_use", s.action_use.clone())?;

        let mut children = Vec::with_capacity(s.children.len());
        for c in &s.children {
            let cd = PyDict::new(py);
            cd.set_item("label", &c.label)?;
            cd.set_item("notifications", c.notifications)?;
            cd.set_item("issued", c.issued)?;
            cd.set_item("useful", c.useful)?;
            cd.set_item("redundant", c.redundant)?;
            children.push(cd);
        }
        d.set_item("children", children)?;
        Ok(d.unbind())
    }
}

impl From<ControllerStats> for PyControllerStats {
    fn from(inner: ControllerStats) -> Self {
        Self { inner }
    }
}
