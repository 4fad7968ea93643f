use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::{ValidationError, WaitConfig};

fn default_propagation_delay_ms() -> u64 {
    10_000
}

/// Settings of the global table reconciliation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Region the reconciler is deployed in. The table in this region is the master copy and is
    /// never torn down by the reconciler.
    pub master_region: String,
    /// Pause before create and update passes start describing tables.
    ///
    /// Table descriptions are eventually consistent: right after a table was created or updated
    /// a describe call may miss it or return a stale view.
    #[serde(default = "default_propagation_delay_ms")]
    pub propagation_delay_ms: u64,
    /// Schedule used while waiting for tables to reach a status.
    #[serde(default = "WaitConfig::table_status")]
    pub table_status_wait: WaitConfig,
    /// Schedule used while waiting for tables to become visible to tag listings.
    #[serde(default = "WaitConfig::tags_visible")]
    pub tags_visible_wait: WaitConfig,
}

impl ReconcilerConfig {
    /// Creates a configuration with default waits for the given master region.
    pub fn new(master_region: impl Into<String>) -> Self {
        Self {
            master_region: master_region.into(),
            propagation_delay_ms: default_propagation_delay_ms(),
            table_status_wait: WaitConfig::table_status(),
            tags_visible_wait: WaitConfig::tags_visible(),
        }
    }

    pub fn propagation_delay(&self) -> Duration {
        Duration::from_millis(self.propagation_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.master_region.trim().is_empty() {
            return Err(ValidationError::MasterRegionEmpty);
        }

        self.table_status_wait.validate("table_status_wait")?;
        self.tags_visible_wait.validate("tags_visible_wait")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_waits_fall_back_to_presets() {
        let config: ReconcilerConfig =
            serde_json::from_str(r#"{ "master_region": "us-east-1" }"#).unwrap();

        assert_eq!(config.propagation_delay(), Duration::from_secs(10));
        assert_eq!(config.table_status_wait, WaitConfig::table_status());
        assert_eq!(config.tags_visible_wait, WaitConfig::tags_visible());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn empty_master_region_is_rejected() {
        let config = ReconcilerConfig::new(" ");
        assert_eq!(config.validate(), Err(ValidationError::MasterRegionEmpty));
    }
}
