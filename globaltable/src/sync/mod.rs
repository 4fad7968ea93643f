//! Bringing regional replica tables in line with the master table.

pub mod indexes;
pub mod table;
pub mod tags;
