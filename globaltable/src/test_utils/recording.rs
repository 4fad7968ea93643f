use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ReconcileResult;
use crate::store::TableStore;
use crate::types::{
    CreateTableRequest, GlobalTableDescription, Region, ReplicaUpdate, TableDescription, TagPage,
    Tags, UpdateTableRequest,
};

/// A call made through a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    DescribeTable {
        region: Region,
        table_name: String,
    },
    CreateTable {
        region: Region,
        request: CreateTableRequest,
    },
    UpdateTable {
        region: Region,
        request: UpdateTableRequest,
    },
    DeleteTable {
        region: Region,
        table_name: String,
    },
    ListTags {
        region: Region,
        resource_arn: String,
    },
    TagResource {
        region: Region,
        resource_arn: String,
        tags: Tags,
    },
    DescribeGlobalTable {
        region: Region,
        global_table_name: String,
    },
    CreateGlobalTable {
        region: Region,
        global_table_name: String,
        replication_group: Vec<Region>,
    },
    UpdateGlobalTable {
        region: Region,
        global_table_name: String,
        replica_updates: Vec<ReplicaUpdate>,
    },
}

impl StoreCall {
    /// Returns `true` for calls that change remote state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            StoreCall::DescribeTable { .. }
                | StoreCall::ListTags { .. }
                | StoreCall::DescribeGlobalTable { .. }
        )
    }
}

/// Test wrapper for [`TableStore`] implementations that records every call.
///
/// Calls are recorded before being forwarded, so failed calls show up as well.
#[derive(Debug, Clone)]
pub struct RecordingStore<S> {
    inner: S,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl<S> RecordingStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn mutating_calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_mutating())
            .cloned()
            .collect()
    }

    /// Regions in which `delete_table` was called, in call order.
    pub async fn deleted_table_regions(&self) -> Vec<Region> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                StoreCall::DeleteTable { region, .. } => Some(region.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }
}

impl<S> TableStore for RecordingStore<S>
where
    S: TableStore + Send + Sync,
{
    fn name() -> &'static str {
        S::name()
    }

    async fn describe_table(
        &self,
        region: &Region,
        table_name: &str,
    ) -> ReconcileResult<Option<TableDescription>> {
        self.record(StoreCall::DescribeTable {
            region: region.clone(),
            table_name: table_name.to_string(),
        })
        .await;

        self.inner.describe_table(region, table_name).await
    }

    async fn create_table(
        &self,
        region: &Region,
        request: CreateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        self.record(StoreCall::CreateTable {
            region: region.clone(),
            request: request.clone(),
        })
        .await;

        self.inner.create_table(region, request).await
    }

    async fn update_table(
        &self,
        region: &Region,
        request: UpdateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        self.record(StoreCall::UpdateTable {
            region: region.clone(),
            request: request.clone(),
        })
        .await;

        self.inner.update_table(region, request).await
    }

    async fn delete_table(&self, region: &Region, table_name: &str) -> ReconcileResult<()> {
        self.record(StoreCall::DeleteTable {
            region: region.clone(),
            table_name: table_name.to_string(),
        })
        .await;

        self.inner.delete_table(region, table_name).await
    }

    async fn list_tags(
        &self,
        region: &Region,
        resource_arn: &str,
    ) -> ReconcileResult<Option<TagPage>> {
        self.record(StoreCall::ListTags {
            region: region.clone(),
            resource_arn: resource_arn.to_string(),
        })
        .await;

        self.inner.list_tags(region, resource_arn).await
    }

    async fn tag_resource(
        &self,
        region: &Region,
        resource_arn: &str,
        tags: Tags,
    ) -> ReconcileResult<()> {
        self.record(StoreCall::TagResource {
            region: region.clone(),
            resource_arn: resource_arn.to_string(),
            tags: tags.clone(),
        })
        .await;

        self.inner.tag_resource(region, resource_arn, tags).await
    }

    async fn describe_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
    ) -> ReconcileResult<Option<GlobalTableDescription>> {
        self.record(StoreCall::DescribeGlobalTable {
            region: region.clone(),
            global_table_name: global_table_name.to_string(),
        })
        .await;

        self.inner
            .describe_global_table(region, global_table_name)
            .await
    }

    async fn create_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replication_group: Vec<Region>,
    ) -> ReconcileResult<GlobalTableDescription> {
        self.record(StoreCall::CreateGlobalTable {
            region: region.clone(),
            global_table_name: global_table_name.to_string(),
            replication_group: replication_group.clone(),
        })
        .await;

        self.inner
            .create_global_table(region, global_table_name, replication_group)
            .await
    }

    async fn update_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replica_updates: Vec<ReplicaUpdate>,
    ) -> ReconcileResult<GlobalTableDescription> {
        self.record(StoreCall::UpdateGlobalTable {
            region: region.clone(),
            global_table_name: global_table_name.to_string(),
            replica_updates: replica_updates.clone(),
        })
        .await;

        self.inner
            .update_global_table(region, global_table_name, replica_updates)
            .await
    }
}
