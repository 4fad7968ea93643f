//! Helpers for testing reconciliation against the in-memory store.
//!
//! - [`recording`] wraps a store and records every call made through it.
//! - [`table`] builds table descriptions and configurations used across tests.

pub mod recording;
pub mod table;
