mod app;
mod base;
mod reconciler;
mod store;
mod wait;

pub use app::*;
pub use base::*;
pub use reconciler::*;
pub use store::*;
pub use wait::*;
