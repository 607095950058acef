//! Common types shared by the controller and its children.
//!
//! 1. **Access notifications:** what the owning cache tells the controller about each access.
//! 2. **Errors:** configuration and persistence error enums.

/// Access notification types.
pub mod access;

/// Error types.
pub mod error;

pub use access::{AccessInfo, AccessType, Requestor};
pub use error::{ConfigError, QTableError};
