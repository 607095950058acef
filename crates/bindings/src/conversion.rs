//! Python↔Rust conversion.
//!
//! Config dicts (e.g., from a Python `ControllerParams.to_dict()`) are converted into the
//! core `ControllerConfig` via JSON serialization, so the same schema is used from both
//! Python and the CLI. Epoch reports travel the other way through the same JSON schema.
//! Core errors are mapped onto Python exception types.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rlpf_core::common::{ConfigError, QTableError};
use rlpf_core::config::ControllerConfig;
use rlpf_core::controller::telemetry::EpochReport;
use serde::Serialize;

/// Converts a Python dict to a `ControllerConfig`.
///
/// # Arguments
///
/// * `py` - Python interpreter handle.
/// * `dict` - A Python dict whose keys match the `ControllerConfig` fields.
///
/// # Returns
///
/// The deserialized config, or a `ValueError` if the dict does not match the schema.
pub fn py_dict_to_config(py: Python<'_>, dict: &Bound<'_, PyAny>) -> PyResult<ControllerConfig> {
    let json = py.import("json")?;
    let dumps = json.getattr("dumps")?;
    let json_str: String = dumps.call1((dict,))?.extract()?;

    serde_json::from_str(&json_str)
        .map_err(|e| PyValueError::new_err(format!("Invalid config: {e}")))
}

/// Converts any serializable value to a Python dict via `json.loads`.
///
/// # Errors
///
/// Returns a `ValueError` if the value does not serialize to a JSON object.
pub fn to_py_dict<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<Py<PyDict>> {
    let json_str = serde_json::to_string(value)
        .map_err(|e| PyValueError::new_err(format!("Serialization failed: {e}")))?;
    let loaded = py.import("json")?.getattr("loads")?.call1((json_str,))?;
    Ok(loaded.downcast_into::<PyDict>()?.unbind())
}

/// Maps a construction error to `ValueError`.
pub fn config_error(e: ConfigError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Maps a persistence error to `IOError`.
pub fn qtable_error(e: QTableError) -> PyErr {
    PyIOError::new_err(e.to_string())
}

/// Converts an epoch report to a Python dict with the same keys as its CSV columns.
///
/// # Errors
///
/// Propagates a `PyErr` if the report cannot be converted.
pub fn report_to_dict(py: Python<'_>, report: &EpochReport) -> PyResult<Py<PyDict>> {
    to_py_dict(py, report)
}
