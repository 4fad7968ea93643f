//! Per-region table synchronization.
//!
//! Replica tables are created from, or patched towards, the description of the master table in
//! the master region. Regions are processed concurrently; the first failure ends the pass.

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::bail;
use crate::concurrency::poller::PollTarget;
use crate::context::ReconcileContext;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::store::TableStore;
use crate::sync::indexes::diff_global_secondary_indexes;
use crate::sync::tags::{list_tags_when_visible, sync_tags};
use crate::types::{
    CreateTableRequest, Region, TableDescription, TableStatus, Tags, UpdateTableRequest,
};

/// What happened to one replica table during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaAction {
    Created,
    Updated,
    Unchanged,
}

/// Result of synchronizing one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSync {
    pub region: Region,
    pub action: ReplicaAction,
    pub tags_replaced: bool,
}

/// Describes `table_name` in `region` until its status is one of `statuses`.
pub async fn wait_for_table_status<S>(
    ctx: &ReconcileContext<S>,
    table_name: &str,
    region: &Region,
    statuses: &[TableStatus],
) -> ReconcileResult<TableDescription>
where
    S: TableStore,
{
    let condition = statuses
        .iter()
        .map(TableStatus::as_str)
        .collect::<Vec<_>>()
        .join(" or ");
    let target = PollTarget::new(table_name, region.clone(), condition);

    let table = ctx
        .table_status_poller()
        .poll(
            &target,
            || ctx.store().describe_table(region, table_name),
            |table| match table {
                Some(table) if statuses.contains(&table.table_status) => true,
                Some(table) => {
                    info!(
                        table = table_name,
                        %region,
                        status = %table.table_status,
                        "table is not in a wanted status yet"
                    );
                    false
                }
                None => {
                    info!(table = table_name, %region, "table does not exist yet");
                    false
                }
            },
        )
        .await?;

    table.ok_or_else(|| {
        reconcile_error!(
            ErrorKind::InvalidState,
            "Table wait accepted a missing table",
            format!("table {table_name} in {region}")
        )
    })
}

/// Waits until the table is `CREATING` or `ACTIVE` in every region.
///
/// Every table of a replication group must be in one of those states before the group can be
/// created or changed.
pub async fn wait_for_replication_ready<S>(
    ctx: &ReconcileContext<S>,
    table_name: &str,
    regions: &[Region],
) -> ReconcileResult<()>
where
    S: TableStore,
{
    info!(
        table = table_name,
        regions = ?regions,
        "waiting for tables to be CREATING or ACTIVE"
    );

    let statuses = TableStatus::REPLICATION_READY;
    try_join_all(
        regions
            .iter()
            .map(|region| wait_for_table_status(ctx, table_name, region, &statuses)),
    )
    .await?;

    Ok(())
}

/// Builds the update that brings `replica` in line with `master`, or `None` if none is needed.
///
/// The update carries the master's replicated attribute definitions and the index changes
/// computed by
/// [`diff_global_secondary_indexes`]. A difference in the base schema alone is enough to issue
/// an update.
pub fn build_update_request(
    master: &TableDescription,
    replica: &TableDescription,
) -> Option<UpdateTableRequest> {
    let index_updates = diff_global_secondary_indexes(master, replica);
    let same_base_schema = master.has_same_base_schema(replica);

    if same_base_schema && index_updates.is_empty() {
        return None;
    }

    Some(UpdateTableRequest {
        table_name: master.table_name.clone(),
        attribute_definitions: master.replicated_attribute_definitions(),
        global_secondary_index_updates: index_updates,
    })
}

/// Copies the master table of `table_name` to every region in `regions`.
///
/// The master table must exist in the master region (any status but `DELETING`) and stream
/// both item images. Replicas are created when missing, otherwise patched, and then receive
/// the master's tags. `regions` must not contain the master region.
pub async fn ensure_replicas<S>(
    ctx: &ReconcileContext<S>,
    table_name: &str,
    regions: &[Region],
) -> ReconcileResult<Vec<ReplicaSync>>
where
    S: TableStore,
{
    let master_region = ctx.master_region();
    if regions.contains(master_region) {
        bail!(
            ErrorKind::InvalidState,
            "The master region cannot be a replica target",
            format!("table {table_name} in {master_region}")
        );
    }

    let master =
        wait_for_table_status(ctx, table_name, master_region, &TableStatus::COPYABLE).await?;

    if !master.has_replication_stream() {
        bail!(
            ErrorKind::UnsupportedConfiguration,
            "The master table does not have the required NEW_AND_OLD_IMAGES stream enabled",
            format!("table {table_name} in {master_region}")
        );
    }

    let master_tags = list_tags_when_visible(ctx, master_region, &master.table_arn).await?;

    try_join_all(
        regions
            .iter()
            .map(|region| ensure_replica(ctx, &master, &master_tags, region)),
    )
    .await
}

async fn ensure_replica<S>(
    ctx: &ReconcileContext<S>,
    master: &TableDescription,
    master_tags: &Tags,
    region: &Region,
) -> ReconcileResult<ReplicaSync>
where
    S: TableStore,
{
    let table_name = master.table_name.as_str();

    let (action, table_arn) = match ctx.store().describe_table(region, table_name).await? {
        None => {
            let request = CreateTableRequest::copy_of(master);
            info!(
                table = table_name,
                %region,
                index_count = request.global_secondary_indexes.len(),
                "creating replica table"
            );

            let created = ctx.store().create_table(region, request).await?;
            (ReplicaAction::Created, created.table_arn)
        }
        Some(replica) => match build_update_request(master, &replica) {
            Some(request) => {
                for update in &request.global_secondary_index_updates {
                    debug!(table = table_name, %region, ?update, "index update needed");
                }
                info!(
                    table = table_name,
                    %region,
                    index_update_count = request.global_secondary_index_updates.len(),
                    "updating replica table"
                );

                let updated = ctx.store().update_table(region, request).await?;
                (ReplicaAction::Updated, updated.table_arn)
            }
            None => {
                info!(table = table_name, %region, "no updates needed for replica table");
                (ReplicaAction::Unchanged, replica.table_arn)
            }
        },
    };

    let tags_replaced = sync_tags(ctx, region, &table_arn, master_tags).await?;

    Ok(ReplicaSync {
        region: region.clone(),
        action,
        tags_replaced,
    })
}

/// Describes the table in every region and logs what was found.
pub async fn describe_and_log<S>(
    ctx: &ReconcileContext<S>,
    table_name: &str,
    regions: &[Region],
) -> ReconcileResult<()>
where
    S: TableStore,
{
    try_join_all(regions.iter().map(|region| async move {
        match ctx.store().describe_table(region, table_name).await? {
            Some(table) => info!(
                table = table_name,
                %region,
                status = %table.table_status,
                description = ?table,
                "table description"
            ),
            None => info!(table = table_name, %region, "table does not exist"),
        }

        Ok::<_, crate::error::ReconcileError>(())
    }))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryTableStore;
    use crate::test_utils::recording::{RecordingStore, StoreCall};
    use crate::test_utils::table::{table_with_indexes, test_reconciler_config};
    use crate::types::{
        AttributeDefinition, IndexStatus, ProvisionedThroughput, ScalarAttributeType,
        StreamSpecification, StreamViewType,
    };

    const MASTER: &str = "us-east-1";

    fn eu() -> Region {
        Region::from("eu-west-1")
    }

    fn ap() -> Region {
        Region::from("ap-south-1")
    }

    async fn context_with_master(
        master: TableDescription,
        master_tags: Tags,
    ) -> ReconcileContext<RecordingStore<MemoryTableStore>> {
        let store = MemoryTableStore::new();
        let master_region = Region::from(MASTER);
        store.set_tags(&master_region, &master.table_arn, master_tags).await;
        store.insert_table(&master_region, master).await;

        ReconcileContext::new(
            RecordingStore::wrap(store),
            &test_reconciler_config(MASTER),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_replicas_are_created_from_master() {
        let mut master = table_with_indexes(&Region::from(MASTER), "orders", &["by_customer"]);
        master.provisioned_throughput = Some(ProvisionedThroughput::new(10, 5));
        let ctx = context_with_master(master.clone(), Tags::from_iter([("env", "prod")])).await;

        let synced = ensure_replicas(&ctx, "orders", &[eu(), ap()]).await.unwrap();

        assert_eq!(synced.len(), 2);
        assert!(synced.iter().all(|s| s.action == ReplicaAction::Created));
        assert!(synced.iter().all(|s| s.tags_replaced));

        let store = ctx.store().inner();
        for region in [eu(), ap()] {
            let replica = store.table(&region, "orders").await.unwrap();
            assert_eq!(replica.attribute_definitions, master.attribute_definitions);
            assert_eq!(replica.key_schema, master.key_schema);
            assert_eq!(replica.provisioned_throughput, master.provisioned_throughput);
            assert!(replica.has_replication_stream());
            assert!(replica.global_secondary_index("by_customer").is_some());
            assert_eq!(
                store.tags(&region, &replica.table_arn).await,
                Some(Tags::from_iter([("env", "prod")]))
            );
        }
    }

    #[tokio::test]
    async fn replica_created_while_master_deletes_an_index() {
        let mut master = table_with_indexes(&Region::from(MASTER), "orders", &["x", "y"]);
        master.global_secondary_indexes[1].index_status = IndexStatus::Deleting;
        let ctx = context_with_master(master, Tags::new()).await;

        let synced = ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap();
        assert_eq!(synced[0].action, ReplicaAction::Created);

        let replica = ctx.store().inner().table(&eu(), "orders").await.unwrap();
        let attribute_names: Vec<&str> = replica
            .attribute_definitions
            .iter()
            .map(|definition| definition.attribute_name.as_str())
            .collect();
        assert_eq!(attribute_names, vec!["id", "x_pk"]);
        assert!(replica.global_secondary_index("y").is_none());

        ctx.store().clear_calls().await;
        let synced = ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap();

        assert_eq!(synced[0].action, ReplicaAction::Unchanged);
        assert!(ctx.store().mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn second_pass_issues_no_mutating_calls() {
        let master = table_with_indexes(&Region::from(MASTER), "orders", &["by_customer"]);
        let ctx = context_with_master(master, Tags::from_iter([("env", "prod")])).await;

        ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap();
        ctx.store().clear_calls().await;

        let synced = ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap();

        assert_eq!(synced[0].action, ReplicaAction::Unchanged);
        assert!(!synced[0].tags_replaced);
        assert!(ctx.store().mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn master_without_required_stream_is_rejected() {
        let mut master = table_with_indexes(&Region::from(MASTER), "orders", &[]);
        master.stream_specification = Some(StreamSpecification {
            stream_enabled: true,
            stream_view_type: Some(StreamViewType::KeysOnly),
        });
        let ctx = context_with_master(master, Tags::new()).await;

        let err = ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
        assert!(ctx.store().mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn master_region_is_not_a_replica_target() {
        let master = table_with_indexes(&Region::from(MASTER), "orders", &[]);
        let ctx = context_with_master(master, Tags::new()).await;

        let err = ensure_replicas(&ctx, "orders", &[Region::from(MASTER)])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn base_schema_change_alone_produces_update() {
        let master = table_with_indexes(&Region::from(MASTER), "orders", &["x"]);
        let mut replica = table_with_indexes(&eu(), "orders", &["x"]);
        replica.attribute_definitions = vec![AttributeDefinition::new(
            "id",
            ScalarAttributeType::Number,
        )];

        let request = build_update_request(&master, &replica).unwrap();

        assert!(request.global_secondary_index_updates.is_empty());
        assert_eq!(request.attribute_definitions, master.attribute_definitions);
    }

    #[test]
    fn throughput_differences_are_ignored() {
        let mut master = table_with_indexes(&Region::from(MASTER), "orders", &["x"]);
        master.provisioned_throughput = Some(ProvisionedThroughput::new(100, 100));
        let mut replica = table_with_indexes(&eu(), "orders", &["x"]);
        replica.provisioned_throughput = Some(ProvisionedThroughput::new(1, 1));
        replica.stream_specification = None;

        assert!(build_update_request(&master, &replica).is_none());
    }

    #[tokio::test]
    async fn replica_index_drift_is_repaired() {
        let master = table_with_indexes(&Region::from(MASTER), "orders", &["x", "y"]);
        let ctx = context_with_master(master, Tags::new()).await;
        ctx.store()
            .inner()
            .insert_table(&eu(), table_with_indexes(&eu(), "orders", &["x", "stale"]))
            .await;

        let synced = ensure_replicas(&ctx, "orders", &[eu()]).await.unwrap();

        assert_eq!(synced[0].action, ReplicaAction::Updated);
        let update_calls = ctx
            .store()
            .calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, StoreCall::UpdateTable { .. }))
            .count();
        assert_eq!(update_calls, 1);

        let replica = ctx.store().inner().table(&eu(), "orders").await.unwrap();
        assert!(replica.global_secondary_index("y").is_some());
        assert!(replica.global_secondary_index("stale").is_none());
    }

    #[tokio::test]
    async fn first_region_failure_fails_the_pass() {
        let master = table_with_indexes(&Region::from(MASTER), "orders", &[]);
        let ctx = context_with_master(master, Tags::new()).await;
        ctx.store().inner().set_region_unavailable(&ap()).await;

        let err = ensure_replicas(&ctx, "orders", &[eu(), ap()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteCallFailed);
    }
}
