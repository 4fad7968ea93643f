//! Waiting primitives for eventually-consistent reads.

pub mod poller;
