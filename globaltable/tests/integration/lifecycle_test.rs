use globaltable::context::ReconcileContext;
use globaltable::resource::{LifecycleEvent, ResourceDispatcher, ResponseStatus};
use globaltable::store::memory::{MemoryTableStore, memory_global_table_arn};
use globaltable::test_utils::recording::{RecordingStore, StoreCall};
use globaltable::test_utils::table::{table_with_indexes, test_reconciler_config};
use globaltable::types::{Region, ReplicaUpdate};
use serde_json::{Value, json};
use telemetry::tracing::init_test_tracing;

const MASTER: &str = "us-east-1";

async fn dispatcher() -> (
    ResourceDispatcher<RecordingStore<MemoryTableStore>>,
    RecordingStore<MemoryTableStore>,
) {
    let store = MemoryTableStore::new();
    let master_region = Region::from(MASTER);
    store
        .insert_table(
            &master_region,
            table_with_indexes(&master_region, "orders", &["by_customer"]),
        )
        .await;

    let store = RecordingStore::wrap(store);
    let ctx = ReconcileContext::new(store.clone(), &test_reconciler_config(MASTER)).unwrap();

    (ResourceDispatcher::new(ctx), store)
}

fn properties(regions: &[&str], delete_unneeded_tables: &str, revision: &str) -> Value {
    let regions: Vec<Value> = regions
        .iter()
        .map(|region| json!({ "region": region }))
        .collect();

    json!({
        "GlobalTableName": "orders",
        "DeploymentRegions": regions,
        "DeleteUnneededTables": delete_unneeded_tables,
        "LastStackUpdate": revision,
        "ServiceToken": "arn:aws:lambda:us-east-1:000000000000:function:custom-resources"
    })
}

fn event(request_type: &str, properties: Value, old_properties: Option<Value>) -> LifecycleEvent {
    let mut event = json!({
        "RequestType": request_type,
        "ResourceType": "Custom::DynamoDBGlobalTable",
        "LogicalResourceId": "OrdersGlobalTable",
        "StackId": "stack-1",
        "RequestId": format!("{request_type}-request"),
        "ResourceProperties": properties
    });
    if request_type != "Create" {
        event["PhysicalResourceId"] = json!("orders");
    }
    if let Some(old_properties) = old_properties {
        event["OldResourceProperties"] = old_properties;
    }

    serde_json::from_value(event).unwrap()
}

fn regions(names: &[&str]) -> std::collections::BTreeSet<Region> {
    names.iter().map(|name| Region::from(*name)).collect()
}

#[tokio::test]
async fn full_lifecycle_of_a_global_table() {
    init_test_tracing();
    let (dispatcher, store) = dispatcher().await;

    // Create in three regions.
    let created = properties(&[MASTER, "eu-west-1", "ap-south-1"], "true", "1");
    let response = dispatcher
        .handle_event(&event("Create", created.clone(), None))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(
        response.data.map(|data| data.arn),
        Some(memory_global_table_arn("orders"))
    );
    assert_eq!(
        store.inner().regions_with_table("orders").await,
        regions(&[MASTER, "eu-west-1", "ap-south-1"])
    );

    // Re-sending the same state changes nothing.
    store.clear_calls().await;
    let response = dispatcher
        .handle_event(&event("Update", created.clone(), Some(created.clone())))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert!(store.mutating_calls().await.is_empty());

    // Swap a region.
    store.clear_calls().await;
    let swapped = properties(&[MASTER, "eu-west-1", "sa-east-1"], "true", "2");
    let response = dispatcher
        .handle_event(&event("Update", swapped.clone(), Some(created)))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(store.deleted_table_regions().await, vec![Region::from("ap-south-1")]);
    let global_table = store.inner().global_table("orders").await.unwrap();
    assert_eq!(
        global_table.replication_group,
        regions(&[MASTER, "eu-west-1", "sa-east-1"])
    );

    // Delete keeps the master table only.
    store.clear_calls().await;
    let response = dispatcher
        .handle_event(&event("Delete", swapped, None))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.physical_resource_id, "orders");
    assert_eq!(
        store.inner().regions_with_table("orders").await,
        regions(&[MASTER])
    );
}

#[tokio::test]
async fn shrinking_without_flag_keeps_replica_tables() {
    init_test_tracing();
    let (dispatcher, store) = dispatcher().await;

    let created = properties(&[MASTER, "eu-west-1", "ap-south-1"], "false", "1");
    dispatcher
        .dispatch(&event("Create", created.clone(), None))
        .await
        .unwrap();
    store.clear_calls().await;

    let shrunk = properties(&[MASTER, "eu-west-1"], "false", "2");
    dispatcher
        .dispatch(&event("Update", shrunk.clone(), Some(created)))
        .await
        .unwrap();

    let global_updates: Vec<Vec<ReplicaUpdate>> = store
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            StoreCall::UpdateGlobalTable {
                replica_updates,
                ..
            } => Some(replica_updates),
            _ => None,
        })
        .collect();
    assert_eq!(
        global_updates,
        vec![vec![ReplicaUpdate::Delete(Region::from("ap-south-1"))]]
    );
    assert!(store.deleted_table_regions().await.is_empty());

    dispatcher
        .dispatch(&event("Delete", shrunk, None))
        .await
        .unwrap();
    assert!(store.deleted_table_regions().await.is_empty());
    assert_eq!(
        store.inner().regions_with_table("orders").await,
        regions(&[MASTER, "eu-west-1", "ap-south-1"])
    );
}

#[tokio::test]
async fn simple_variant_only_touches_the_global_table() {
    init_test_tracing();
    let (dispatcher, store) = dispatcher().await;
    let eu = Region::from("eu-west-1");
    store
        .inner()
        .insert_table(&eu, table_with_indexes(&eu, "orders", &[]))
        .await;

    let simple = json!({
        "GlobalTableName": "orders",
        "IsSimpleType": "true",
        "Regions": [{ "region": MASTER }, { "region": "eu-west-1" }]
    });
    let response = dispatcher
        .handle_event(&event("Create", simple.clone(), None))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);

    let calls = store.mutating_calls().await;
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        calls[0],
        StoreCall::CreateGlobalTable { .. }
    ));

    let response = dispatcher
        .handle_event(&event("Update", simple.clone(), Some(simple)))
        .await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(store.mutating_calls().await.len(), 1);
}
