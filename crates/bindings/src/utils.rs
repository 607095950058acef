//! Utility functions exposed to Python.

use pyo3::prelude::*;
use tracing_subscriber::EnvFilter;

/// Returns the bindings version string (e.g., for scripting or diagnostics).
#[pyfunction]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Installs a stderr `tracing` subscriber for controller logs.
///
/// `filter` uses `RUST_LOG` syntax (e.g. `"rlpf_core=debug"`); without it,
/// `RUST_LOG` is read and falls back to `warn`. Calling this more than once
/// is harmless.
///
/// # Returns
///
/// `True` if this call installed the subscriber.
#[pyfunction]
#[pyo3(signature = (filter=None))]
pub fn init_logging(filter: Option<String>) -> bool {
    let filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        EnvFilter::new,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
