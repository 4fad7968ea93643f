//! Access to the remote table store.

mod base;
#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod memory;

pub use base::TableStore;
