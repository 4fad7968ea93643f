use std::path::Path;
use std::time::Duration;

use config::shared::{AppConfig, StoreConfig};
use globaltable::context::ReconcileContext;
use globaltable::resource::{LifecycleEvent, ResourceDispatcher, ResourceResponse};
use globaltable::store::TableStore;
use globaltable::store::dynamodb::{DynamoDbStoreConfig, DynamoDbTableStore};
use globaltable::store::memory::MemoryTableStore;
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::error::ReconcilerResult;

/// Reads the event and runs it against the configured store.
///
/// Failures of the reconciliation itself end up in the returned response. Only problems that
/// prevent running the event at all, like an unreadable event, are returned as errors.
pub async fn run_event(
    app_config: AppConfig,
    event_path: Option<&Path>,
) -> ReconcilerResult<ResourceResponse> {
    let event = read_event(event_path).await?;

    info!(
        master_region = %app_config.reconciler.master_region,
        store = ?app_config.store,
        "starting reconciler"
    );

    // Static dispatch per store type.
    match &app_config.store {
        StoreConfig::Memory => {
            let store = MemoryTableStore::new();
            handle_with_store(store, &app_config, &event).await
        }
        StoreConfig::DynamoDb {
            endpoint,
            timeout_ms,
        } => {
            let store = DynamoDbTableStore::from_env(DynamoDbStoreConfig {
                endpoint: endpoint.clone(),
                timeout: timeout_ms.map(Duration::from_millis),
            })
            .await;
            handle_with_store(store, &app_config, &event).await
        }
    }
}

async fn handle_with_store<S>(
    store: S,
    app_config: &AppConfig,
    event: &LifecycleEvent,
) -> ReconcilerResult<ResourceResponse>
where
    S: TableStore + Clone + Send + Sync,
{
    info!(store = S::name(), "using table store");

    let ctx = ReconcileContext::new(store, &app_config.reconciler)?;
    let dispatcher = ResourceDispatcher::new(ctx);
    let response = dispatcher.handle_event(event).await;

    info!(
        status = ?response.status,
        physical_resource_id = %response.physical_resource_id,
        "lifecycle event handled"
    );

    Ok(response)
}

async fn read_event(event_path: Option<&Path>) -> ReconcilerResult<LifecycleEvent> {
    let raw = match event_path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            raw
        }
    };

    let event: LifecycleEvent = serde_json::from_str(&raw)?;
    info!(
        request_type = ?event.request_type,
        resource_type = %event.resource_type,
        logical_resource_id = %event.logical_resource_id,
        "received lifecycle event"
    );

    Ok(event)
}
