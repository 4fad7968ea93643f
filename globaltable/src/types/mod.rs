//! Data types describing tables, global tables and the requests sent to the store.

mod global_table;
mod region;
mod requests;
mod spec;
mod table;
mod tags;

pub use global_table::*;
pub use region::*;
pub use requests::*;
pub use spec::*;
pub use table::*;
pub use tags::*;
