//! # Child Prefetcher Tests
//!
//! Each built-in policy against the access patterns it targets, plus the
//! factory that builds children from configuration.

/// Child construction from configuration.
pub mod factory;
