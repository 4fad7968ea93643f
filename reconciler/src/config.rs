use config::load_config;
use config::shared::AppConfig;

use crate::error::{ReconcilerError, ReconcilerResult};

/// Loads and validates the reconciler configuration.
pub fn load_app_config() -> ReconcilerResult<AppConfig> {
    let config = load_config::<AppConfig>().map_err(ReconcilerError::config)?;
    config.validate().map_err(ReconcilerError::config)?;

    Ok(config)
}
