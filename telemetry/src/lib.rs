//! Logging setup shared by the reconciler binary and tests.

pub mod tracing;
