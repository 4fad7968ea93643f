//! Create, update and delete passes over a global table.

mod global;
mod simple;

pub use global::{GlobalTableReconciler, diff_replication_group};
pub use simple::SimpleGlobalTableReconciler;
