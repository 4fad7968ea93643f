use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReconcileError;
use crate::types::ReconcileOutcome;

/// Prefix the orchestrator puts in front of every custom resource type.
const CUSTOM_RESOURCE_TYPE_PREFIX: &str = "Custom::";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A create, update or delete request for one custom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Value,
    /// Properties before the change. Only sent with updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(
        rename = "ResponseURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_url: Option<String>,
}

impl LifecycleEvent {
    /// Resource type without the `Custom::` prefix.
    pub fn resource_type_name(&self) -> &str {
        self.resource_type
            .strip_prefix(CUSTOM_RESOURCE_TYPE_PREFIX)
            .unwrap_or(&self.resource_type)
    }

    /// Physical id reported when the handler did not produce one.
    pub fn fallback_physical_resource_id(&self) -> &str {
        self.physical_resource_id
            .as_deref()
            .unwrap_or(&self.logical_resource_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseData {
    pub arn: String,
}

/// Answer to a [`LifecycleEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceResponse {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl ResourceResponse {
    pub fn success(event: &LifecycleEvent, outcome: ReconcileOutcome) -> Self {
        Self {
            status: ResponseStatus::Success,
            physical_resource_id: outcome.physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            reason: None,
            data: outcome.global_table_arn.map(|arn| ResponseData { arn }),
        }
    }

    pub fn failure(event: &LifecycleEvent, err: &ReconcileError) -> Self {
        Self {
            status: ResponseStatus::Failed,
            physical_resource_id: event.fallback_physical_resource_id().to_string(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            reason: Some(err.message()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
