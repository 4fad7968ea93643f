use tracing::info;

use crate::bail;
use crate::context::ReconcileContext;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconciler::global::diff_replication_group;
use crate::store::TableStore;
use crate::types::{DesiredGlobalTableSpec, ReconcileOutcome};

/// Reconciles a global table whose replica tables are provisioned by someone else.
///
/// Only the replication group is managed. Replica tables are never created, patched or
/// deleted. Deleting the resource leaves the global table in place.
#[derive(Debug, Clone)]
pub struct SimpleGlobalTableReconciler<S> {
    ctx: ReconcileContext<S>,
}

impl<S> SimpleGlobalTableReconciler<S>
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
        info!(table = table_name, regions = ?desired.regions, "creating global table");

        let created = self
            .ctx
            .store()
            .create_global_table(self.ctx.master_region(), table_name, desired.regions.clone())
            .await?;

        Ok(ReconcileOutcome::new(table_name).with_global_table_arn(created.global_table_arn))
    }

    /// Aligns the replication group of an existing global table with `desired`.
    pub async fn update(&self, desired: &DesiredGlobalTableSpec) -> ReconcileResult<ReconcileOutcome> {
        let table_name = desired.table_name.as_str();
        let master_region = self.ctx.master_region();

        let Some(current) = self
            .ctx
            .store()
            .describe_global_table(master_region, table_name)
            .await?
        else {
            bail!(
                ErrorKind::ResourceNotFound,
                "Global table to update does not exist",
                format!("global table {table_name} in {master_region}")
            );
        };

        let outcome =
            ReconcileOutcome::new(table_name).with_global_table_arn(&current.global_table_arn);

        let replica_updates = diff_replication_group(&desired.regions, &current.replication_group);
        if replica_updates.is_empty() {
            info!(table = table_name, "no update needed for global table");
            return Ok(outcome);
        }

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

    /// Leaves the global table and its replicas untouched and reports the table name.
    pub fn delete(&self, table_name: &str) -> ReconcileOutcome {
        info!(table = table_name, "leaving global table in place on delete");
        ReconcileOutcome::new(table_name)
    }
}
