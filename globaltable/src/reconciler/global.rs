use std::collections::BTreeSet;

use futures::future::try_join_all;
use tracing::info;

use crate::bail;
use crate::context::ReconcileContext;
use crate::error::{ErrorKind, ReconcileResult};
use crate::store::TableStore;
use crate::sync::table::{describe_and_log, ensure_replicas, wait_for_replication_ready};
use crate::types::{DesiredGlobalTableSpec, ReconcileOutcome, Region, ReplicaUpdate};

/// Computes the changes that turn `current` into `desired`.
///
/// Regions to add come first, in desired order, followed by regions to remove.
pub fn diff_replication_group(
    desired: &[Region],
    current: &BTreeSet<Region>,
) -> Vec<ReplicaUpdate> {
    let additions = desired
        .iter()
        .filter(|region| !current.contains(*region))
        .cloned()
        .map(ReplicaUpdate::Create);
    let removals = current
        .iter()
        .filter(|region| !desired.contains(*region))
        .cloned()
        .map(ReplicaUpdate::Delete);

    additions.chain(removals).collect()
}

/// Reconciles a global table whose replica tables are managed by the reconciler.
///
/// Each pass first copies the master table to every replica region, then creates or updates
/// the global table, and finally tears down replicas that left the group when asked to. No
/// state is kept between passes: re-running a pass with the same desired state converges from
/// whatever an interrupted pass left behind.
#[derive(Debug, Clone)]
pub struct GlobalTableReconciler<S> {
    ctx: ReconcileContext<S>,
}

impl<S> GlobalTableReconciler<S>
where
    S: TableStore + Send + Sync,
{
    pub fn new(ctx: ReconcileContext<S>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ReconcileContext<S> {
        &self.ctx
    }

    pub async fn create(&self, desired: &DesiredGlobalTableSpec) -> ReconcileResult<ReconcileOutcome> {
        let table_name = desired.table_name.as_str();
        info!(
            table = table_name,
            regions = ?desired.regions,
            "starting create of global table"
        );

        self.wait_for_propagation(table_name).await;

        let replica_regions = desired.replica_regions(self.ctx.master_region());
        ensure_replicas(&self.ctx, table_name, &replica_regions).await?;
        describe_and_log(&self.ctx, table_name, &desired.regions).await?;

        self.ensure_consistent(desired).await
    }

    /// Moves the global table from `previous` to `desired`.
    ///
    /// Replicas of regions that left the group are deleted after the group was updated, and
    /// only if `desired.delete_unneeded_tables` is set.
    pub async fn update(
        &self,
        desired: &DesiredGlobalTableSpec,
        previous: &DesiredGlobalTableSpec,
    ) -> ReconcileResult<ReconcileOutcome> {
        let table_name = desired.table_name.as_str();
        info!(
            table = table_name,
            regions = ?desired.regions,
            previous_regions = ?previous.regions,
            "starting update of global table"
        );

        self.wait_for_propagation(table_name).await;

        let master_region = self.ctx.master_region();
        let replica_regions = desired.replica_regions(master_region);
        ensure_replicas(&self.ctx, table_name, &replica_regions).await?;

        let mut observed_regions = desired.regions.clone();
        for region in &previous.regions {
            if !observed_regions.contains(region) {
                observed_regions.push(region.clone());
            }
        }
        describe_and_log(&self.ctx, table_name, &observed_regions).await?;

        let outcome = self.ensure_consistent(desired).await?;

        let removed_regions: Vec<Region> = previous
            .replica_regions(master_region)
            .into_iter()
            .filter(|region| !replica_regions.contains(region))
            .collect();

        if removed_regions.is_empty() {
            return Ok(outcome);
        }

        if desired.delete_unneeded_tables {
            self.remove_replica_tables(table_name, &removed_regions)
                .await?;
        } else {
            info!(
                table = table_name,
                regions = ?removed_regions,
                "not deleting replica tables because deleting unneeded tables is disabled"
            );
        }

        Ok(outcome)
    }

    /// Retires the global table.
    ///
    /// Replica tables are deleted only if `desired.delete_unneeded_tables` is set; the master
    /// table is never touched.
    pub async fn delete(&self, desired: &DesiredGlobalTableSpec) -> ReconcileResult<ReconcileOutcome> {
        let table_name = desired.table_name.as_str();
        let replica_regions = desired.replica_regions(self.ctx.master_region());

        if desired.delete_unneeded_tables {
            self.remove_replica_tables(table_name, &replica_regions)
                .await?;
        } else {
            info!(
                table = table_name,
                regions = ?replica_regions,
                "not deleting replica tables because deleting unneeded tables is disabled"
            );
        }

        Ok(ReconcileOutcome::new(table_name))
    }

    /// Creates the global table, or aligns the regions of an existing one with `desired`.
    ///
    /// Issues no call at all when the replication group already matches.
    pub async fn ensure_consistent(
        &self,
        desired: &DesiredGlobalTableSpec,
    ) -> ReconcileResult<ReconcileOutcome> {
        let table_name = desired.table_name.as_str();
        let master_region = self.ctx.master_region();

        let Some(current) = self
            .ctx
            .store()
            .describe_global_table(master_region, table_name)
            .await?
        else {
            wait_for_replication_ready(&self.ctx, table_name, &desired.regions).await?;

            info!(table = table_name, regions = ?desired.regions, "creating global table");
            let created = self
                .ctx
                .store()
                .create_global_table(master_region, table_name, desired.regions.clone())
                .await?;

            return Ok(ReconcileOutcome::new(table_name)
                .with_global_table_arn(created.global_table_arn));
        };

        let outcome =
            ReconcileOutcome::new(table_name).with_global_table_arn(&current.global_table_arn);

        let replica_updates = diff_replication_group(&desired.regions, &current.replication_group);
        if replica_updates.is_empty() {
            info!(table = table_name, "no update needed for global table");
            return Ok(outcome);
        }

        let mut wait_regions = desired.regions.clone();
        for region in &current.replication_group {
            if !wait_regions.contains(region) {
                wait_regions.push(region.clone());
            }
        }
        wait_for_replication_ready(&self.ctx, table_name, &wait_regions).await?;

        info!(
            table = table_name,
            updates = ?replica_updates,
            "updating replication group of global table"
        );
        self.ctx
            .store()
            .update_global_table(master_region, table_name, replica_updates)
            .await?;

        Ok(outcome)
    }

    /// Deletes the replica tables of `table_name` in `regions`, skipping regions where the table
    /// no longer exists. Returns the regions in which a table was deleted.
    ///
    /// Refuses to run if `regions` contains the master region.
    pub async fn remove_replica_tables(
        &self,
        table_name: &str,
        regions: &[Region],
    ) -> ReconcileResult<Vec<Region>> {
        let master_region = self.ctx.master_region();
        if regions.contains(master_region) {
            bail!(
                ErrorKind::InvalidState,
                "Refusing to delete the table in the master region",
                format!("table {table_name} in {master_region}")
            );
        }

        let store = self.ctx.store();
        let deleted = try_join_all(regions.iter().map(|region| async move {
            if store.describe_table(region, table_name).await?.is_none() {
                info!(table = table_name, %region, "replica table already gone");
                return Ok(None);
            }

            info!(table = table_name, %region, "deleting replica table");
            store.delete_table(region, table_name).await?;
            info!(table = table_name, %region, "deleted replica table");

            Ok::<_, crate::error::ReconcileError>(Some(region.clone()))
        }))
        .await?;

        Ok(deleted.into_iter().flatten().collect())
    }

    async fn wait_for_propagation(&self, table_name: &str) {
        let delay = self.ctx.propagation_delay();
        if delay.is_zero() {
            return;
        }

        // Descriptions right after a table change may miss the table or show stale state.
        info!(
            table = table_name,
            delay_ms = delay.as_millis() as u64,
            "pausing before describing tables"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryTableStore, memory_global_table_arn};
    use crate::test_utils::recording::{RecordingStore, StoreCall};
    use crate::test_utils::table::{insert_tables, table_with_indexes, test_reconciler_config};
    use crate::types::{GlobalTableDescription, TableStatus, Tags};

    const MASTER: &str = "us-east-1";

    fn regions(names: &[&str]) -> Vec<Region> {
        names.iter().map(|name| Region::from(*name)).collect()
    }

    async fn reconciler(
        store: MemoryTableStore,
    ) -> GlobalTableReconciler<RecordingStore<MemoryTableStore>> {
        let master_region = Region::from(MASTER);
        store
            .insert_table(
                &master_region,
                table_with_indexes(&master_region, "orders", &["by_customer"]),
            )
            .await;

        let ctx = ReconcileContext::new(
            RecordingStore::wrap(store),
            &test_reconciler_config(MASTER),
        )
        .unwrap();
        GlobalTableReconciler::new(ctx)
    }

    fn spec(names: &[&str]) -> DesiredGlobalTableSpec {
        DesiredGlobalTableSpec::new("orders", regions(names)).with_last_stack_update("1")
    }

    #[test]
    fn replication_group_diff_is_minimal() {
        let current: BTreeSet<Region> = regions(&["a", "b"]).into_iter().collect();

        let updates = diff_replication_group(&regions(&["a", "b", "c"]), &current);

        assert_eq!(updates, vec![ReplicaUpdate::Create(Region::from("c"))]);
    }

    #[test]
    fn replication_group_diff_adds_and_removes() {
        let current: BTreeSet<Region> = regions(&["a", "b"]).into_iter().collect();

        let updates = diff_replication_group(&regions(&["c", "a"]), &current);

        assert_eq!(
            updates,
            vec![
                ReplicaUpdate::Create(Region::from("c")),
                ReplicaUpdate::Delete(Region::from("b")),
            ]
        );
    }

    #[tokio::test]
    async fn create_builds_replicas_and_global_table() {
        let reconciler = reconciler(MemoryTableStore::new()).await;

        let outcome = reconciler
            .create(&spec(&[MASTER, "eu-west-1", "ap-south-1"]))
            .await
            .unwrap();

        assert_eq!(outcome.physical_resource_id, "orders");
        assert_eq!(
            outcome.global_table_arn.as_deref(),
            Some(memory_global_table_arn("orders").as_str())
        );

        let store = reconciler.context().store().inner();
        let global_table = store.global_table("orders").await.unwrap();
        assert_eq!(
            global_table.replication_group,
            regions(&[MASTER, "eu-west-1", "ap-south-1"])
                .into_iter()
                .collect()
        );
        assert_eq!(
            store.regions_with_table("orders").await,
            regions(&[MASTER, "eu-west-1", "ap-south-1"])
                .into_iter()
                .collect()
        );
    }

    #[tokio::test]
    async fn reconciling_converged_state_is_a_no_op() {
        let reconciler = reconciler(MemoryTableStore::new()).await;
        let desired = spec(&[MASTER, "eu-west-1", "ap-south-1"]);
        let first = reconciler.create(&desired).await.unwrap();
        reconciler.context().store().clear_calls().await;

        let second = reconciler.update(&desired, &desired).await.unwrap();

        assert_eq!(first, second);
        assert!(
            reconciler
                .context()
                .store()
                .mutating_calls()
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn adding_a_region_sends_one_create_instruction() {
        let store = MemoryTableStore::new();
        insert_tables(&store, "orders", &regions(&["eu-west-1"])).await;
        store
            .insert_global_table(GlobalTableDescription {
                global_table_name: "orders".to_string(),
                global_table_arn: memory_global_table_arn("orders"),
                replication_group: regions(&[MASTER, "eu-west-1"]).into_iter().collect(),
            })
            .await;
        let reconciler = reconciler(store).await;

        reconciler
            .update(
                &spec(&[MASTER, "eu-west-1", "ap-south-1"]),
                &spec(&[MASTER, "eu-west-1"]),
            )
            .await
            .unwrap();

        let global_updates: Vec<Vec<ReplicaUpdate>> = reconciler
            .context()
            .store()
            .calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::UpdateGlobalTable {
                    replica_updates, ..
                } => Some(replica_updates),
                _ => None,
            })
            .collect();
        assert_eq!(
            global_updates,
            vec![vec![ReplicaUpdate::Create(Region::from("ap-south-1"))]]
        );
    }

    #[tokio::test]
    async fn removed_regions_are_torn_down_only_when_enabled() {
        for delete_unneeded_tables in [false, true] {
            let reconciler = reconciler(MemoryTableStore::new()).await;
            let previous = spec(&[MASTER, "eu-west-1", "ap-south-1"]);
            reconciler.create(&previous).await.unwrap();
            reconciler.context().store().clear_calls().await;

            let desired =
                spec(&[MASTER, "eu-west-1"]).with_delete_unneeded_tables(delete_unneeded_tables);
            reconciler.update(&desired, &previous).await.unwrap();

            let store = reconciler.context().store();
            let deleted = store.deleted_table_regions().await;
            if delete_unneeded_tables {
                assert_eq!(deleted, regions(&["ap-south-1"]));
                assert!(
                    store
                        .inner()
                        .table(&Region::from("ap-south-1"), "orders")
                        .await
                        .is_none()
                );
            } else {
                assert!(deleted.is_empty());
            }

            let global_table = store.inner().global_table("orders").await.unwrap();
            assert_eq!(
                global_table.replication_group,
                regions(&[MASTER, "eu-west-1"]).into_iter().collect()
            );
        }
    }

    #[tokio::test]
    async fn delete_without_flag_deletes_nothing() {
        let reconciler = reconciler(MemoryTableStore::new()).await;
        let desired = spec(&[MASTER, "eu-west-1", "ap-south-1"]);
        reconciler.create(&desired).await.unwrap();
        reconciler.context().store().clear_calls().await;

        let outcome = reconciler.delete(&desired).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::new("orders"));
        assert!(
            reconciler
                .context()
                .store()
                .mutating_calls()
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn delete_with_flag_removes_every_replica() {
        let reconciler = reconciler(MemoryTableStore::new()).await;
        let desired = spec(&[MASTER, "eu-west-1", "ap-south-1"]);
        reconciler.create(&desired).await.unwrap();
        reconciler.context().store().clear_calls().await;

        reconciler
            .delete(&desired.clone().with_delete_unneeded_tables(true))
            .await
            .unwrap();

        let store = reconciler.context().store();
        let mut deleted = store.deleted_table_regions().await;
        deleted.sort();
        assert_eq!(deleted, regions(&["ap-south-1", "eu-west-1"]));
        assert!(
            store
                .inner()
                .table(&Region::from(MASTER), "orders")
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn teardown_refuses_master_region() {
        let reconciler = reconciler(MemoryTableStore::new()).await;

        let err = reconciler
            .remove_replica_tables("orders", &regions(&["eu-west-1", MASTER]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(
            reconciler
                .context()
                .store()
                .deleted_table_regions()
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn teardown_skips_missing_tables() {
        let store = MemoryTableStore::new();
        insert_tables(&store, "orders", &regions(&["eu-west-1"])).await;
        let reconciler = reconciler(store).await;

        let deleted = reconciler
            .remove_replica_tables("orders", &regions(&["eu-west-1", "ap-south-1"]))
            .await
            .unwrap();

        assert_eq!(deleted, regions(&["eu-west-1"]));
    }

    #[tokio::test]
    async fn deleting_replica_blocks_global_table_creation() {
        let store = MemoryTableStore::new();
        let reconciler = reconciler(store).await;
        let eu = Region::from("eu-west-1");
        let inner = reconciler.context().store().inner();
        inner
            .insert_table(&eu, table_with_indexes(&eu, "orders", &["by_customer"]))
            .await;
        inner.set_table_status(&eu, "orders", TableStatus::Deleting).await;

        let err = reconciler
            .create(&spec(&[MASTER, "eu-west-1"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PollTimeout);
        assert!(inner.global_table("orders").await.is_none());
    }

    #[tokio::test]
    async fn master_tags_reach_new_replicas() {
        let store = MemoryTableStore::new().with_tag_visibility_lag(3);
        let master_region = Region::from(MASTER);
        let master = table_with_indexes(&master_region, "orders", &["by_customer"]);
        store
            .set_tags(
                &master_region,
                &master.table_arn,
                Tags::from_iter([("env", "prod")]),
            )
            .await;
        let reconciler = reconciler(store).await;

        reconciler
            .create(&spec(&[MASTER, "eu-west-1"]))
            .await
            .unwrap();

        let inner = reconciler.context().store().inner();
        let eu = Region::from("eu-west-1");
        let replica = inner.table(&eu, "orders").await.unwrap();
        assert_eq!(
            inner.tags(&eu, &replica.table_arn).await,
            Some(Tags::from_iter([("env", "prod")]))
        );
    }
}
