use globaltable::context::ReconcileContext;
use globaltable::error::ErrorKind;
use globaltable::reconciler::GlobalTableReconciler;
use globaltable::store::memory::MemoryTableStore;
use globaltable::test_utils::recording::{RecordingStore, StoreCall};
use globaltable::test_utils::table::{global_index, table_with_indexes, test_reconciler_config};
use globaltable::types::{DesiredGlobalTableSpec, IndexStatus, Region, TableStatus, Tags};
use telemetry::tracing::init_test_tracing;

const MASTER: &str = "us-east-1";
const TABLE: &str = "orders";

fn region(name: &str) -> Region {
    Region::from(name)
}

fn reconciler(
    store: MemoryTableStore,
) -> GlobalTableReconciler<RecordingStore<MemoryTableStore>> {
    let ctx = ReconcileContext::new(
        RecordingStore::wrap(store),
        &test_reconciler_config(MASTER),
    )
    .unwrap();

    GlobalTableReconciler::new(ctx)
}

fn index_names(store_table: &globaltable::types::TableDescription) -> Vec<String> {
    let mut names: Vec<String> = store_table
        .global_secondary_indexes
        .iter()
        .map(|index| index.index_name.clone())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn replica_indexes_converge_to_master() {
    init_test_tracing();

    let store = MemoryTableStore::new();
    let mut master = table_with_indexes(&region(MASTER), TABLE, &["a", "b"]);
    master.global_secondary_indexes[1].index_status = IndexStatus::Deleting;
    store.insert_table(&region(MASTER), master).await;

    let eu = region("eu-west-1");
    let mut replica = table_with_indexes(&eu, TABLE, &["b"]);
    replica.global_secondary_indexes.push(global_index("c"));
    store.insert_table(&eu, replica).await;

    let reconciler = reconciler(store);
    reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1"]).with_last_stack_update("1"))
        .await
        .unwrap();

    let replica = reconciler
        .context()
        .store()
        .inner()
        .table(&eu, TABLE)
        .await
        .unwrap();
    assert_eq!(index_names(&replica), vec!["a".to_string()]);

    // A second pass finds nothing left to change.
    reconciler.context().store().clear_calls().await;
    reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1"]).with_last_stack_update("1"))
        .await
        .unwrap();
    assert!(reconciler.context().store().mutating_calls().await.is_empty());
}

#[tokio::test]
async fn master_without_stream_is_rejected_before_any_change() {
    init_test_tracing();

    let store = MemoryTableStore::new();
    let mut master = table_with_indexes(&region(MASTER), TABLE, &["a"]);
    master.stream_specification = None;
    store.insert_table(&region(MASTER), master).await;
    let eu = region("eu-west-1");
    store
        .insert_table(&eu, table_with_indexes(&eu, TABLE, &[]))
        .await;

    let reconciler = reconciler(store);
    let err = reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1", "ap-south-1"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
    assert!(reconciler.context().store().mutating_calls().await.is_empty());
}

#[tokio::test]
async fn replica_tags_are_replaced_not_merged() {
    init_test_tracing();

    let store = MemoryTableStore::new().with_tag_visibility_lag(2);
    let master = table_with_indexes(&region(MASTER), TABLE, &[]);
    store
        .set_tags(
            &region(MASTER),
            &master.table_arn,
            Tags::from_iter([("team", "payments"), ("env", "prod")]),
        )
        .await;
    store.insert_table(&region(MASTER), master).await;

    let eu = region("eu-west-1");
    let replica = table_with_indexes(&eu, TABLE, &[]);
    store
        .set_tags(
            &eu,
            &replica.table_arn,
            Tags::from_iter([("env", "staging"), ("owner", "someone")]),
        )
        .await;
    store.insert_table(&eu, replica.clone()).await;

    let reconciler = reconciler(store);
    reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1"]))
        .await
        .unwrap();

    let store = reconciler.context().store();
    assert_eq!(
        store.inner().tags(&eu, &replica.table_arn).await,
        Some(Tags::from_iter([("team", "payments"), ("env", "prod")]))
    );
    let tag_calls = store
        .calls()
        .await
        .into_iter()
        .filter(|call| matches!(call, StoreCall::TagResource { .. }))
        .count();
    assert_eq!(tag_calls, 1);
}

#[tokio::test]
async fn slow_replica_creation_is_awaited() {
    init_test_tracing();

    let store = MemoryTableStore::new().with_created_table_status(TableStatus::Creating);
    store
        .insert_table(&region(MASTER), table_with_indexes(&region(MASTER), TABLE, &["a"]))
        .await;

    let reconciler = reconciler(store);
    let outcome = reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1", "ap-south-1"]))
        .await
        .unwrap();

    assert!(outcome.global_table_arn.is_some());
    let inner = reconciler.context().store().inner();
    let replica = inner.table(&region("ap-south-1"), TABLE).await.unwrap();
    assert_eq!(replica.table_status, TableStatus::Creating);
    assert!(inner.global_table(TABLE).await.is_some());
}

#[tokio::test]
async fn failing_region_fails_the_pass() {
    init_test_tracing();

    let store = MemoryTableStore::new();
    store
        .insert_table(&region(MASTER), table_with_indexes(&region(MASTER), TABLE, &[]))
        .await;
    store.set_region_unavailable(&region("ap-south-1")).await;

    let reconciler = reconciler(store);
    let err = reconciler
        .create(&DesiredGlobalTableSpec::new(TABLE, [MASTER, "eu-west-1", "ap-south-1"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteCallFailed);
    assert!(
        reconciler
            .context()
            .store()
            .inner()
            .global_table(TABLE)
            .await
            .is_none()
    );
}
