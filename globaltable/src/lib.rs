//! Reconciliation engine for tables replicated across regions.
//!
//! A [`reconciler::GlobalTableReconciler`] brings every regional replica of a table in line with
//! the master copy and then creates or updates the global table that links them. All state lives
//! in the remote store behind [`store::TableStore`] and is re-read on every pass.

pub mod concurrency;
pub mod context;
pub mod error;
mod macros;
pub mod reconciler;
pub mod resource;
pub mod store;
pub mod sync;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
