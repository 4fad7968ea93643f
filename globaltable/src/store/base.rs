use std::future::Future;

use crate::error::ReconcileResult;
use crate::types::{
    CreateTableRequest, GlobalTableDescription, Region, ReplicaUpdate, TagPage, Tags,
    TableDescription, UpdateTableRequest,
};

/// Operations the reconciler needs from the remote table store.
///
/// Every call targets one region explicitly. Implementations are expected to be cheap to clone
/// and shareable between the tasks that process different regions concurrently.
///
/// Describe and list calls report a missing resource as `Ok(None)`. That outcome drives the
/// "create" branches of the reconciler and must not be surfaced as an error. Any other failure
/// is returned as is and ends the reconciliation pass.
pub trait TableStore {
    /// Returns the name of the store.
    fn name() -> &'static str;

    /// Describes a table, returning `None` if it does not exist in `region`.
    fn describe_table(
        &self,
        region: &Region,
        table_name: &str,
    ) -> impl Future<Output = ReconcileResult<Option<TableDescription>>> + Send;

    fn create_table(
        &self,
        region: &Region,
        request: CreateTableRequest,
    ) -> impl Future<Output = ReconcileResult<TableDescription>> + Send;

    /// Applies attribute definition and global secondary index changes to an existing table.
    fn update_table(
        &self,
        region: &Region,
        request: UpdateTableRequest,
    ) -> impl Future<Output = ReconcileResult<TableDescription>> + Send;

    fn delete_table(
        &self,
        region: &Region,
        table_name: &str,
    ) -> impl Future<Output = ReconcileResult<()>> + Send;

    /// Lists the tags of a resource, returning `None` while the resource is not visible to tag
    /// listings yet.
    ///
    /// Only the first page is returned. A truncated page carries a `next_token`.
    fn list_tags(
        &self,
        region: &Region,
        resource_arn: &str,
    ) -> impl Future<Output = ReconcileResult<Option<TagPage>>> + Send;

    /// Replaces the tags of a resource.
    ///
    /// Once the call returns, the resource carries exactly `tags`: keys absent from `tags` are
    /// removed.
    fn tag_resource(
        &self,
        region: &Region,
        resource_arn: &str,
        tags: Tags,
    ) -> impl Future<Output = ReconcileResult<()>> + Send;

    /// Describes a global table, returning `None` if it does not exist.
    fn describe_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
    ) -> impl Future<Output = ReconcileResult<Option<GlobalTableDescription>>> + Send;

    fn create_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replication_group: Vec<Region>,
    ) -> impl Future<Output = ReconcileResult<GlobalTableDescription>> + Send;

    fn update_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replica_updates: Vec<ReplicaUpdate>,
    ) -> impl Future<Output = ReconcileResult<GlobalTableDescription>> + Send;
}
