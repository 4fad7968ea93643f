//! Shared configuration for the global table reconciler.
//!
//! Configuration is loaded in layers: a base file, an environment specific file and finally
//! `APP_`-prefixed environment variables. See [`load_config`] for the exact lookup rules.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
