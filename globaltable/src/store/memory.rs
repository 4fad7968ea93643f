use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, ReconcileResult};
use crate::store::TableStore;
use crate::types::{
    CreateTableRequest, GlobalSecondaryIndex, GlobalTableDescription, IndexStatus, Region,
    ReplicaIndexUpdate, ReplicaUpdate, TableDescription, TableStatus, TagPage, Tags,
    UpdateTableRequest,
};

/// Account id used in the ARNs minted by [`MemoryTableStore`].
const MEMORY_ACCOUNT_ID: &str = "000000000000";

/// Returns the ARN [`MemoryTableStore`] assigns to a table.
pub fn memory_table_arn(region: &Region, table_name: &str) -> String {
    format!("arn:aws:dynamodb:{region}:{MEMORY_ACCOUNT_ID}:table/{table_name}")
}

/// Returns the ARN [`MemoryTableStore`] assigns to a global table.
pub fn memory_global_table_arn(global_table_name: &str) -> String {
    format!("arn:aws:dynamodb::{MEMORY_ACCOUNT_ID}:global-table/{global_table_name}")
}

/// Behavior of a [`MemoryTableStore`] that is fixed at construction.
#[derive(Debug, Clone)]
struct Settings {
    /// Status given to tables right after creation.
    created_table_status: TableStatus,
    /// Number of tag listings that miss a freshly created table.
    tag_visibility_lag: u32,
    /// Maximum number of tags returned by a single listing.
    tag_page_size: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            created_table_status: TableStatus::Active,
            tag_visibility_lag: 0,
            tag_page_size: None,
        }
    }
}

/// Inner state of [`MemoryTableStore`].
#[derive(Debug, Default)]
struct Inner {
    /// Tables keyed by region and table name.
    tables: HashMap<(Region, String), TableDescription>,
    /// Tags keyed by region and resource ARN.
    tags: HashMap<(Region, String), Tags>,
    /// Remaining tag listings that will not see a resource yet.
    tag_misses: HashMap<(Region, String), u32>,
    /// Global tables keyed by name.
    global_tables: HashMap<String, GlobalTableDescription>,
    /// Regions whose calls all fail.
    unavailable_regions: HashSet<Region>,
}

impl Inner {
    fn ensure_available(&self, region: &Region) -> ReconcileResult<()> {
        if self.unavailable_regions.contains(region) {
            bail!(
                ErrorKind::RemoteCallFailed,
                "Region is unavailable",
                format!("region {region} does not accept calls")
            );
        }

        Ok(())
    }

    fn table_by_arn(&self, region: &Region, resource_arn: &str) -> Option<&TableDescription> {
        self.tables
            .iter()
            .find(|((table_region, _), table)| {
                table_region == region && table.table_arn == resource_arn
            })
            .map(|(_, table)| table)
    }
}

/// In-memory table store spanning any number of regions.
///
/// Mimics the parts of the remote store the reconciler relies on, including the lag between
/// creating a table and seeing it in tag listings. Data is lost when the last clone is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    inner: Arc<Mutex<Inner>>,
    settings: Settings,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status of tables right after `create_table`.
    pub fn with_created_table_status(mut self, status: TableStatus) -> Self {
        self.settings.created_table_status = status;
        self
    }

    /// Makes the first `misses` tag listings of every created table report it as not visible.
    pub fn with_tag_visibility_lag(mut self, misses: u32) -> Self {
        self.settings.tag_visibility_lag = misses;
        self
    }

    /// Limits how many tags a single listing returns.
    pub fn with_tag_page_size(mut self, page_size: usize) -> Self {
        self.settings.tag_page_size = Some(page_size);
        self
    }

    /// Stores a table as is, replacing any table with the same name in `region`.
    pub async fn insert_table(&self, region: &Region, table: TableDescription) {
        let mut inner = self.inner.lock().await;
        let tags_key = (region.clone(), table.table_arn.clone());
        inner.tags.entry(tags_key).or_default();
        inner
            .tables
            .insert((region.clone(), table.table_name.clone()), table);
    }

    pub async fn table(&self, region: &Region, table_name: &str) -> Option<TableDescription> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(&(region.clone(), table_name.to_string()))
            .cloned()
    }

    /// Regions that currently hold a table named `table_name`.
    pub async fn regions_with_table(&self, table_name: &str) -> BTreeSet<Region> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .keys()
            .filter(|(_, name)| name == table_name)
            .map(|(region, _)| region.clone())
            .collect()
    }

    pub async fn set_table_status(&self, region: &Region, table_name: &str, status: TableStatus) {
        let mut inner = self.inner.lock().await;
        if let Some(table) = inner
            .tables
            .get_mut(&(region.clone(), table_name.to_string()))
        {
            table.table_status = status;
        }
    }

    pub async fn set_tags(&self, region: &Region, resource_arn: &str, tags: Tags) {
        let mut inner = self.inner.lock().await;
        inner
            .tags
            .insert((region.clone(), resource_arn.to_string()), tags);
    }

    pub async fn tags(&self, region: &Region, resource_arn: &str) -> Option<Tags> {
        let inner = self.inner.lock().await;
        inner
            .tags
            .get(&(region.clone(), resource_arn.to_string()))
            .cloned()
    }

    pub async fn insert_global_table(&self, global_table: GlobalTableDescription) {
        let mut inner = self.inner.lock().await;
        inner
            .global_tables
            .insert(global_table.global_table_name.clone(), global_table);
    }

    pub async fn global_table(&self, global_table_name: &str) -> Option<GlobalTableDescription> {
        let inner = self.inner.lock().await;
        inner.global_tables.get(global_table_name).cloned()
    }

    /// Makes every subsequent call targeting `region` fail.
    pub async fn set_region_unavailable(&self, region: &Region) {
        let mut inner = self.inner.lock().await;
        inner.unavailable_regions.insert(region.clone());
    }
}

impl TableStore for MemoryTableStore {
    fn name() -> &'static str {
        "memory"
    }

    async fn describe_table(
        &self,
        region: &Region,
        table_name: &str,
    ) -> ReconcileResult<Option<TableDescription>> {
        let inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        Ok(inner
            .tables
            .get(&(region.clone(), table_name.to_string()))
            .cloned())
    }

    async fn create_table(
        &self,
        region: &Region,
        request: CreateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        let key = (region.clone(), request.table_name.clone());
        if inner.tables.contains_key(&key) {
            bail!(
                ErrorKind::RemoteResourceInUse,
                "Table already exists",
                format!("table {} in {region}", request.table_name)
            );
        }

        let unused = request.unused_attribute_definitions();
        if !unused.is_empty() {
            bail!(
                ErrorKind::RemoteValidationFailed,
                "Attribute definitions are not used by any key schema",
                format!("table {} in {region}: {}", request.table_name, unused.join(", "))
            );
        }

        let index_status = match self.settings.created_table_status {
            TableStatus::Active => IndexStatus::Active,
            _ => IndexStatus::Creating,
        };

        let table = TableDescription {
            table_arn: memory_table_arn(region, &request.table_name),
            table_name: request.table_name,
            table_status: self.settings.created_table_status.clone(),
            stream_specification: request.stream_specification,
            attribute_definitions: request.attribute_definitions,
            key_schema: request.key_schema,
            provisioned_throughput: request.provisioned_throughput,
            local_secondary_indexes: request.local_secondary_indexes,
            global_secondary_indexes: request
                .global_secondary_indexes
                .into_iter()
                .map(|definition| GlobalSecondaryIndex {
                    index_name: definition.index_name,
                    key_schema: definition.key_schema,
                    projection: definition.projection,
                    provisioned_throughput: definition.provisioned_throughput,
                    index_status: index_status.clone(),
                })
                .collect(),
        };

        let tags_key = (region.clone(), table.table_arn.clone());
        inner.tags.insert(tags_key.clone(), Tags::new());
        if self.settings.tag_visibility_lag > 0 {
            inner
                .tag_misses
                .insert(tags_key, self.settings.tag_visibility_lag);
        }
        inner.tables.insert(key, table.clone());

        info!(table = %table.table_name, %region, "created table in memory store");

        Ok(table)
    }

    async fn update_table(
        &self,
        region: &Region,
        request: UpdateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        let Some(table) = inner
            .tables
            .get_mut(&(region.clone(), request.table_name.clone()))
        else {
            bail!(
                ErrorKind::ResourceNotFound,
                "Table to update does not exist",
                format!("table {} in {region}", request.table_name)
            );
        };

        // Validate the whole request before applying anything, like the remote store does.
        for update in &request.global_secondary_index_updates {
            let exists = table.global_secondary_index(update.index_name()).is_some();
            match update {
                ReplicaIndexUpdate::Create(_) if exists => bail!(
                    ErrorKind::RemoteValidationFailed,
                    "Global secondary index already exists",
                    update.index_name()
                ),
                ReplicaIndexUpdate::Delete { .. } if !exists => bail!(
                    ErrorKind::RemoteValidationFailed,
                    "Global secondary index does not exist",
                    update.index_name()
                ),
                _ => {}
            }
        }

        table.attribute_definitions = request.attribute_definitions;
        for update in request.global_secondary_index_updates {
            match update {
                ReplicaIndexUpdate::Create(definition) => {
                    table.global_secondary_indexes.push(GlobalSecondaryIndex {
                        index_name: definition.index_name,
                        key_schema: definition.key_schema,
                        projection: definition.projection,
                        provisioned_throughput: definition.provisioned_throughput,
                        index_status: IndexStatus::Creating,
                    });
                }
                ReplicaIndexUpdate::Delete { index_name } => {
                    table
                        .global_secondary_indexes
                        .retain(|index| index.index_name != index_name);
                }
            }
        }

        Ok(table.clone())
    }

    async fn delete_table(&self, region: &Region, table_name: &str) -> ReconcileResult<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        let Some(table) = inner
            .tables
            .remove(&(region.clone(), table_name.to_string()))
        else {
            bail!(
                ErrorKind::ResourceNotFound,
                "Table to delete does not exist",
                format!("table {table_name} in {region}")
            );
        };

        let tags_key = (region.clone(), table.table_arn);
        inner.tags.remove(&tags_key);
        inner.tag_misses.remove(&tags_key);

        Ok(())
    }

    async fn list_tags(
        &self,
        region: &Region,
        resource_arn: &str,
    ) -> ReconcileResult<Option<TagPage>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        if inner.table_by_arn(region, resource_arn).is_none() {
            return Ok(None);
        }

        let key = (region.clone(), resource_arn.to_string());
        if let Some(misses) = inner.tag_misses.get_mut(&key) {
            if *misses > 0 {
                *misses -= 1;
                return Ok(None);
            }
        }

        let tags = inner.tags.get(&key).cloned().unwrap_or_default();
        let page = match self.settings.tag_page_size {
            Some(page_size) if tags.len() > page_size => TagPage {
                tags: tags.into_iter().take(page_size).collect(),
                next_token: Some(format!("{resource_arn}#{page_size}")),
            },
            _ => TagPage::complete(tags),
        };

        Ok(Some(page))
    }

    async fn tag_resource(
        &self,
        region: &Region,
        resource_arn: &str,
        tags: Tags,
    ) -> ReconcileResult<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        if inner.table_by_arn(region, resource_arn).is_none() {
            bail!(
                ErrorKind::ResourceNotFound,
                "Resource to tag does not exist",
                format!("{resource_arn} in {region}")
            );
        }

        inner
            .tags
            .insert((region.clone(), resource_arn.to_string()), tags);

        Ok(())
    }

    async fn describe_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
    ) -> ReconcileResult<Option<GlobalTableDescription>> {
        let inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        Ok(inner.global_tables.get(global_table_name).cloned())
    }

    async fn create_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replication_group: Vec<Region>,
    ) -> ReconcileResult<GlobalTableDescription> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        if inner.global_tables.contains_key(global_table_name) {
            bail!(
                ErrorKind::RemoteResourceInUse,
                "Global table already exists",
                global_table_name
            );
        }

        if replication_group.is_empty() {
            bail!(
                ErrorKind::RemoteValidationFailed,
                "Replication group is empty",
                global_table_name
            );
        }

        for replica_region in &replication_group {
            let replica = inner
                .tables
                .get(&(replica_region.clone(), global_table_name.to_string()));
            if !replica.is_some_and(TableDescription::has_replication_stream) {
                bail!(
                    ErrorKind::RemoteValidationFailed,
                    "Replica table is missing or has no replication stream",
                    format!("table {global_table_name} in {replica_region}")
                );
            }
        }

        let global_table = GlobalTableDescription {
            global_table_name: global_table_name.to_string(),
            global_table_arn: memory_global_table_arn(global_table_name),
            replication_group: replication_group.into_iter().collect(),
        };
        inner
            .global_tables
            .insert(global_table_name.to_string(), global_table.clone());

        Ok(global_table)
    }

    async fn update_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replica_updates: Vec<ReplicaUpdate>,
    ) -> ReconcileResult<GlobalTableDescription> {
        let mut inner = self.inner.lock().await;
        inner.ensure_available(region)?;

        let Some(mut global_table) = inner.global_tables.get(global_table_name).cloned() else {
            bail!(
                ErrorKind::ResourceNotFound,
                "Global table does not exist",
                global_table_name
            );
        };

        for update in replica_updates {
            match update {
                ReplicaUpdate::Create(replica_region) => {
                    if inner
                        .tables
                        .get(&(replica_region.clone(), global_table_name.to_string()))
                        .is_none()
                    {
                        bail!(
                            ErrorKind::RemoteValidationFailed,
                            "Replica table does not exist",
                            format!("table {global_table_name} in {replica_region}")
                        );
                    }

                    if !global_table.replication_group.insert(replica_region.clone()) {
                        bail!(
                            ErrorKind::RemoteValidationFailed,
                            "Replica already exists",
                            replica_region
                        );
                    }
                }
                ReplicaUpdate::Delete(replica_region) => {
                    if !global_table.replication_group.remove(&replica_region) {
                        bail!(
                            ErrorKind::RemoteValidationFailed,
                            "Replica does not exist",
                            replica_region
                        );
                    }
                }
            }
        }

        inner
            .global_tables
            .insert(global_table_name.to_string(), global_table.clone());

        Ok(global_table)
    }
}
