use serde::{Deserialize, Serialize};

/// Remote store the reconciler talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local store, mostly useful for dry runs.
    Memory,
    /// Amazon DynamoDB, one client per region.
    DynamoDb {
        /// Endpoint override, e.g. a local emulator.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        /// Per-operation timeout in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::DynamoDb {
            endpoint: None,
            timeout_ms: None,
        }
    }
}
