use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{ReconcilerConfig, StoreConfig, ValidationError};

/// Complete configuration of the reconciler binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.reconciler.validate()
    }
}

impl Config for AppConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
