//! # Unit Components
//!
//! Tests grouped by the component they exercise: configuration, child
//! prefetchers, the learning core, the controller and its statistics.


/// Unit tests for the child prefetch policies.
pub mod prefetch;



/// Statistics accounting and reporting.
pub mod stats;
