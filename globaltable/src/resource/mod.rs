//! Lifecycle events sent by the deployment orchestrator and the handlers that serve them.

mod event;
mod handler;
mod properties;

pub use event::{LifecycleEvent, RequestType, ResourceResponse, ResponseData, ResponseStatus};
pub use handler::{ResourceDispatcher, ResourceHandler, ResourceKind};
pub use properties::{
    global_table_name, normalize_global_table_properties, normalize_simple_global_table_properties,
};
