//! [`TableStore`] backed by Amazon DynamoDB.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types as sdk;
use aws_smithy_types::timeout::TimeoutConfig;
use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, ReconcileError, ReconcileResult};
use crate::reconcile_error;
use crate::store::TableStore;
use crate::types::{
    AttributeDefinition, CreateTableRequest, GlobalSecondaryIndex,
    GlobalSecondaryIndexDefinition, GlobalTableDescription, IndexStatus, KeySchemaElement,
    KeyType, LocalSecondaryIndex, Projection, ProjectionType, ProvisionedThroughput, Region,
    ReplicaIndexUpdate, ReplicaUpdate, ScalarAttributeType, StreamSpecification, StreamViewType,
    TableDescription, TableStatus, TagPage, Tags, UpdateTableRequest,
};

/// Connection settings shared by the clients of every region.
#[derive(Debug, Clone, Default)]
pub struct DynamoDbStoreConfig {
    /// Endpoint override, e.g. a local emulator.
    pub endpoint: Option<String>,
    /// Per-operation timeout.
    pub timeout: Option<Duration>,
}

/// DynamoDB-based table store.
///
/// Holds one client per region, built lazily from a shared [`aws_config::SdkConfig`] so that
/// credentials and the HTTP client are reused across regions.
#[derive(Clone)]
pub struct DynamoDbTableStore {
    sdk_config: aws_config::SdkConfig,
    config: DynamoDbStoreConfig,
    clients: Arc<Mutex<HashMap<Region, Client>>>,
}

impl fmt::Debug for DynamoDbTableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDbTableStore")
            .field("config", &self.config)
            .finish()
    }
}

impl DynamoDbTableStore {
    pub fn new(sdk_config: aws_config::SdkConfig, config: DynamoDbStoreConfig) -> Self {
        Self {
            sdk_config,
            config,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Loads credentials and defaults from the environment and builds a store.
    pub async fn from_env(config: DynamoDbStoreConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(sdk_config, config)
    }

    fn client(&self, region: &Region) -> Client {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients
            .entry(region.clone())
            .or_insert_with(|| self.build_client(region))
            .clone()
    }

    fn build_client(&self, region: &Region) -> Client {
        // Inherit HTTP client, credentials and retry settings, then override the region.
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_dynamodb::config::Region::new(region.as_str().to_string()));

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout) = self.config.timeout {
            let timeout_config = TimeoutConfig::builder().operation_timeout(timeout).build();
            builder = builder.timeout_config(timeout_config);
        }

        debug!(%region, "building dynamodb client");

        Client::from_conf(builder.build())
    }
}

impl From<BuildError> for ReconcileError {
    #[track_caller]
    fn from(err: BuildError) -> ReconcileError {
        reconcile_error!(
            ErrorKind::RequestBuildFailed,
            "Failed to build DynamoDB request",
            err.to_string(),
            source: err
        )
    }
}

/// Maps a failed DynamoDB call to a [`ReconcileError`], classified by service error code.
fn remote_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> ReconcileError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: fmt::Debug,
{
    let (kind, description) = match err.code() {
        Some("ThrottlingException" | "ProvisionedThroughputExceededException") => (
            ErrorKind::RemoteThrottled,
            "DynamoDB throttled the request",
        ),
        Some("AccessDeniedException" | "UnrecognizedClientException") => (
            ErrorKind::RemotePermissionDenied,
            "DynamoDB denied the request",
        ),
        Some("ValidationException") => (
            ErrorKind::RemoteValidationFailed,
            "DynamoDB rejected the request",
        ),
        Some("ResourceInUseException" | "GlobalTableAlreadyExistsException") => (
            ErrorKind::RemoteResourceInUse,
            "DynamoDB resource is in use",
        ),
        Some("LimitExceededException") => (
            ErrorKind::RemoteLimitExceeded,
            "DynamoDB limit exceeded",
        ),
        Some(
            "ResourceNotFoundException"
            | "GlobalTableNotFoundException"
            | "TableNotFoundException",
        ) => (ErrorKind::ResourceNotFound, "DynamoDB resource not found"),
        _ => (ErrorKind::RemoteCallFailed, "DynamoDB call failed"),
    };

    let detail = format!("{operation}: {}", DisplayErrorContext(&err));
    ReconcileError::from((kind, description, detail))
}

fn incomplete(what: &'static str) -> ReconcileError {
    reconcile_error!(
        ErrorKind::RemoteCallFailed,
        "DynamoDB returned an incomplete description",
        format!("missing {what}")
    )
}

fn unsupported_value(what: &'static str, value: &str) -> ReconcileError {
    reconcile_error!(
        ErrorKind::RemoteCallFailed,
        "DynamoDB returned an unsupported value",
        format!("{what}: {value}")
    )
}

// Conversions from the SDK model.

fn table_from_sdk(table: &sdk::TableDescription) -> ReconcileResult<TableDescription> {
    let stream_specification = table
        .stream_specification()
        .map(|stream| {
            let stream_view_type = stream
                .stream_view_type()
                .map(|view_type| {
                    StreamViewType::parse(view_type.as_str())
                        .ok_or_else(|| unsupported_value("stream view type", view_type.as_str()))
                })
                .transpose()?;

            Ok::<_, ReconcileError>(StreamSpecification {
                stream_enabled: stream.stream_enabled(),
                stream_view_type,
            })
        })
        .transpose()?;

    let local_secondary_indexes = table
        .local_secondary_indexes()
        .iter()
        .map(|index| -> ReconcileResult<LocalSecondaryIndex> {
            Ok(LocalSecondaryIndex {
                index_name: index
                    .index_name()
                    .ok_or_else(|| incomplete("local secondary index name"))?
                    .to_string(),
                key_schema: key_schema_from_sdk(index.key_schema())?,
                projection: projection_from_sdk(index.projection())?,
            })
        })
        .collect::<ReconcileResult<Vec<_>>>()?;

    let global_secondary_indexes = table
        .global_secondary_indexes()
        .iter()
        .map(|index| -> ReconcileResult<GlobalSecondaryIndex> {
            Ok(GlobalSecondaryIndex {
                index_name: index
                    .index_name()
                    .ok_or_else(|| incomplete("global secondary index name"))?
                    .to_string(),
                key_schema: key_schema_from_sdk(index.key_schema())?,
                projection: projection_from_sdk(index.projection())?,
                provisioned_throughput: throughput_from_sdk(index.provisioned_throughput()),
                index_status: index
                    .index_status()
                    .map(|status| IndexStatus::from(status.as_str()))
                    .unwrap_or(IndexStatus::Active),
            })
        })
        .collect::<ReconcileResult<Vec<_>>>()?;

    Ok(TableDescription {
        table_name: table
            .table_name()
            .ok_or_else(|| incomplete("table name"))?
            .to_string(),
        table_arn: table
            .table_arn()
            .ok_or_else(|| incomplete("table arn"))?
            .to_string(),
        table_status: table
            .table_status()
            .map(|status| TableStatus::from(status.as_str()))
            .ok_or_else(|| incomplete("table status"))?,
        stream_specification,
        attribute_definitions: table
            .attribute_definitions()
            .iter()
            .map(|definition| -> ReconcileResult<AttributeDefinition> {
                let attribute_type = ScalarAttributeType::parse(definition.attribute_type().as_str())
                    .ok_or_else(|| {
                        unsupported_value("attribute type", definition.attribute_type().as_str())
                    })?;

                Ok(AttributeDefinition::new(
                    definition.attribute_name(),
                    attribute_type,
                ))
            })
            .collect::<ReconcileResult<Vec<_>>>()?,
        key_schema: key_schema_from_sdk(table.key_schema())?,
        provisioned_throughput: throughput_from_sdk(table.provisioned_throughput()),
        local_secondary_indexes,
        global_secondary_indexes,
    })
}

fn key_schema_from_sdk(elements: &[sdk::KeySchemaElement]) -> ReconcileResult<Vec<KeySchemaElement>> {
    elements
        .iter()
        .map(|element| -> ReconcileResult<KeySchemaElement> {
            let key_type = KeyType::parse(element.key_type().as_str())
                .ok_or_else(|| unsupported_value("key type", element.key_type().as_str()))?;

            Ok(KeySchemaElement {
                attribute_name: element.attribute_name().to_string(),
                key_type,
            })
        })
        .collect()
}

fn projection_from_sdk(projection: Option<&sdk::Projection>) -> ReconcileResult<Projection> {
    let Some(projection) = projection else {
        return Ok(Projection {
            projection_type: None,
            non_key_attributes: Vec::new(),
        });
    };

    let projection_type = projection
        .projection_type()
        .map(|projection_type| {
            ProjectionType::parse(projection_type.as_str())
                .ok_or_else(|| unsupported_value("projection type", projection_type.as_str()))
        })
        .transpose()?;

    Ok(Projection {
        projection_type,
        non_key_attributes: projection.non_key_attributes().to_vec(),
    })
}

/// On-demand tables report zero capacity, which is treated as no provisioned throughput.
fn throughput_from_sdk(
    throughput: Option<&sdk::ProvisionedThroughputDescription>,
) -> Option<ProvisionedThroughput> {
    let throughput = throughput?;
    let read = throughput.read_capacity_units().unwrap_or(0);
    let write = throughput.write_capacity_units().unwrap_or(0);

    (read > 0 || write > 0).then(|| ProvisionedThroughput::new(read, write))
}

fn global_table_from_sdk(
    description: &sdk::GlobalTableDescription,
) -> ReconcileResult<GlobalTableDescription> {
    Ok(GlobalTableDescription {
        global_table_name: description
            .global_table_name()
            .ok_or_else(|| incomplete("global table name"))?
            .to_string(),
        global_table_arn: description
            .global_table_arn()
            .ok_or_else(|| incomplete("global table arn"))?
            .to_string(),
        replication_group: description
            .replication_group()
            .iter()
            .filter_map(|replica| replica.region_name())
            .map(Region::from)
            .collect(),
    })
}

// Conversions to the SDK model.

fn attribute_definitions_to_sdk(
    definitions: &[AttributeDefinition],
) -> ReconcileResult<Vec<sdk::AttributeDefinition>> {
    definitions
        .iter()
        .map(|definition| -> ReconcileResult<sdk::AttributeDefinition> {
            Ok(sdk::AttributeDefinition::builder()
                .attribute_name(&definition.attribute_name)
                .attribute_type(sdk::ScalarAttributeType::from(
                    definition.attribute_type.as_str(),
                ))
                .build()?)
        })
        .collect()
}

fn key_schema_to_sdk(elements: &[KeySchemaElement]) -> ReconcileResult<Vec<sdk::KeySchemaElement>> {
    elements
        .iter()
        .map(|element| -> ReconcileResult<sdk::KeySchemaElement> {
            Ok(sdk::KeySchemaElement::builder()
                .attribute_name(&element.attribute_name)
                .key_type(sdk::KeyType::from(element.key_type.as_str()))
                .build()?)
        })
        .collect()
}

fn projection_to_sdk(projection: &Projection) -> sdk::Projection {
    let non_key_attributes =
        (!projection.non_key_attributes.is_empty()).then(|| projection.non_key_attributes.clone());

    sdk::Projection::builder()
        .set_projection_type(
            projection
                .projection_type
                .map(|projection_type| sdk::ProjectionType::from(projection_type.as_str())),
        )
        .set_non_key_attributes(non_key_attributes)
        .build()
}

fn throughput_to_sdk(throughput: &ProvisionedThroughput) -> ReconcileResult<sdk::ProvisionedThroughput> {
    Ok(sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()?)
}

fn stream_to_sdk(stream: &StreamSpecification) -> ReconcileResult<sdk::StreamSpecification> {
    Ok(sdk::StreamSpecification::builder()
        .stream_enabled(stream.stream_enabled)
        .set_stream_view_type(
            stream
                .stream_view_type
                .map(|view_type| sdk::StreamViewType::from(view_type.as_str())),
        )
        .build()?)
}

fn global_secondary_index_to_sdk(
    definition: &GlobalSecondaryIndexDefinition,
) -> ReconcileResult<sdk::GlobalSecondaryIndex> {
    Ok(sdk::GlobalSecondaryIndex::builder()
        .index_name(&definition.index_name)
        .set_key_schema(Some(key_schema_to_sdk(&definition.key_schema)?))
        .projection(projection_to_sdk(&definition.projection))
        .set_provisioned_throughput(
            definition
                .provisioned_throughput
                .as_ref()
                .map(throughput_to_sdk)
                .transpose()?,
        )
        .build()?)
}

fn index_update_to_sdk(update: &ReplicaIndexUpdate) -> ReconcileResult<sdk::GlobalSecondaryIndexUpdate> {
    let update = match update {
        ReplicaIndexUpdate::Create(definition) => {
            let action = sdk::CreateGlobalSecondaryIndexAction::builder()
                .index_name(&definition.index_name)
                .set_key_schema(Some(key_schema_to_sdk(&definition.key_schema)?))
                .projection(projection_to_sdk(&definition.projection))
                .set_provisioned_throughput(
                    definition
                        .provisioned_throughput
                        .as_ref()
                        .map(throughput_to_sdk)
                        .transpose()?,
                )
                .build()?;

            sdk::GlobalSecondaryIndexUpdate::builder().create(action).build()
        }
        ReplicaIndexUpdate::Delete { index_name } => {
            let action = sdk::DeleteGlobalSecondaryIndexAction::builder()
                .index_name(index_name)
                .build()?;

            sdk::GlobalSecondaryIndexUpdate::builder().delete(action).build()
        }
    };

    Ok(update)
}

fn replica_update_to_sdk(update: &ReplicaUpdate) -> ReconcileResult<sdk::ReplicaUpdate> {
    let update = match update {
        ReplicaUpdate::Create(region) => sdk::ReplicaUpdate::builder()
            .create(
                sdk::CreateReplicaAction::builder()
                    .region_name(region.as_str())
                    .build()?,
            )
            .build(),
        ReplicaUpdate::Delete(region) => sdk::ReplicaUpdate::builder()
            .delete(
                sdk::DeleteReplicaAction::builder()
                    .region_name(region.as_str())
                    .build()?,
            )
            .build(),
    };

    Ok(update)
}

impl TableStore for DynamoDbTableStore {
    fn name() -> &'static str {
        "dynamodb"
    }

    async fn describe_table(
        &self,
        region: &Region,
        table_name: &str,
    ) -> ReconcileResult<Option<TableDescription>> {
        let result = self
            .client(region)
            .describe_table()
            .table_name(table_name)
            .send()
            .await;

        match result {
            Ok(output) => output.table().map(table_from_sdk).transpose(),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                info!(table = table_name, %region, "table does not exist");
                Ok(None)
            }
            Err(err) => Err(remote_error("DescribeTable", err)),
        }
    }

    async fn create_table(
        &self,
        region: &Region,
        request: CreateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        let local_secondary_indexes = request
            .local_secondary_indexes
            .iter()
            .map(|index| -> ReconcileResult<sdk::LocalSecondaryIndex> {
                Ok(sdk::LocalSecondaryIndex::builder()
                    .index_name(&index.index_name)
                    .set_key_schema(Some(key_schema_to_sdk(&index.key_schema)?))
                    .projection(projection_to_sdk(&index.projection))
                    .build()?)
            })
            .collect::<ReconcileResult<Vec<_>>>()?;

        let global_secondary_indexes = request
            .global_secondary_indexes
            .iter()
            .map(global_secondary_index_to_sdk)
            .collect::<ReconcileResult<Vec<_>>>()?;

        let mut builder = self
            .client(region)
            .create_table()
            .table_name(&request.table_name)
            .set_attribute_definitions(Some(attribute_definitions_to_sdk(
                &request.attribute_definitions,
            )?))
            .set_key_schema(Some(key_schema_to_sdk(&request.key_schema)?))
            .set_stream_specification(
                request
                    .stream_specification
                    .as_ref()
                    .map(stream_to_sdk)
                    .transpose()?,
            )
            .set_local_secondary_indexes(
                (!local_secondary_indexes.is_empty()).then_some(local_secondary_indexes),
            )
            .set_global_secondary_indexes(
                (!global_secondary_indexes.is_empty()).then_some(global_secondary_indexes),
            );

        builder = match &request.provisioned_throughput {
            Some(throughput) => builder
                .billing_mode(sdk::BillingMode::Provisioned)
                .provisioned_throughput(throughput_to_sdk(throughput)?),
            None => builder.billing_mode(sdk::BillingMode::PayPerRequest),
        };

        let output = builder
            .send()
            .await
            .map_err(|err| remote_error("CreateTable", err))?;

        let Some(table) = output.table_description() else {
            return Err(incomplete("created table description"));
        };

        table_from_sdk(table)
    }

    async fn update_table(
        &self,
        region: &Region,
        request: UpdateTableRequest,
    ) -> ReconcileResult<TableDescription> {
        let index_updates = request
            .global_secondary_index_updates
            .iter()
            .map(index_update_to_sdk)
            .collect::<ReconcileResult<Vec<_>>>()?;

        let output = self
            .client(region)
            .update_table()
            .table_name(&request.table_name)
            .set_attribute_definitions(Some(attribute_definitions_to_sdk(
                &request.attribute_definitions,
            )?))
            .set_global_secondary_index_updates(
                (!index_updates.is_empty()).then_some(index_updates),
            )
            .send()
            .await
            .map_err(|err| remote_error("UpdateTable", err))?;

        let Some(table) = output.table_description() else {
            return Err(incomplete("updated table description"));
        };

        table_from_sdk(table)
    }

    async fn delete_table(&self, region: &Region, table_name: &str) -> ReconcileResult<()> {
        self.client(region)
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|err| remote_error("DeleteTable", err))?;

        Ok(())
    }

    async fn list_tags(
        &self,
        region: &Region,
        resource_arn: &str,
    ) -> ReconcileResult<Option<TagPage>> {
        let result = self
            .client(region)
            .list_tags_of_resource()
            .resource_arn(resource_arn)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(TagPage {
                tags: output
                    .tags()
                    .iter()
                    .map(|tag| (tag.key(), tag.value()))
                    .collect(),
                next_token: output.next_token().map(str::to_string),
            })),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                info!(resource_arn, %region, "resource not visible to tag listings yet");
                Ok(None)
            }
            Err(err) => Err(remote_error("ListTagsOfResource", err)),
        }
    }

    async fn tag_resource(
        &self,
        region: &Region,
        resource_arn: &str,
        tags: Tags,
    ) -> ReconcileResult<()> {
        let client = self.client(region);

        // DynamoDB merges tags, so keys that are not part of the new set are removed first.
        let current = client
            .list_tags_of_resource()
            .resource_arn(resource_arn)
            .send()
            .await
            .map_err(|err| remote_error("ListTagsOfResource", err))?;
        if current.next_token().is_some() {
            bail!(
                ErrorKind::UnsupportedConfiguration,
                "Too many tags to replace in a single pass",
                resource_arn
            );
        }

        let stale_keys: Vec<String> = current
            .tags()
            .iter()
            .map(|tag| tag.key())
            .filter(|key| !tags.contains_key(key))
            .map(str::to_string)
            .collect();

        if !stale_keys.is_empty() {
            client
                .untag_resource()
                .resource_arn(resource_arn)
                .set_tag_keys(Some(stale_keys))
                .send()
                .await
                .map_err(|err| remote_error("UntagResource", err))?;
        }

        if tags.is_empty() {
            return Ok(());
        }

        let sdk_tags = tags
            .iter()
            .map(|(key, value)| -> ReconcileResult<sdk::Tag> {
                Ok(sdk::Tag::builder().key(key).value(value).build()?)
            })
            .collect::<ReconcileResult<Vec<_>>>()?;

        client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(Some(sdk_tags))
            .send()
            .await
            .map_err(|err| remote_error("TagResource", err))?;

        Ok(())
    }

    async fn describe_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
    ) -> ReconcileResult<Option<GlobalTableDescription>> {
        let result = self
            .client(region)
            .describe_global_table()
            .global_table_name(global_table_name)
            .send()
            .await;

        match result {
            Ok(output) => output
                .global_table_description()
                .map(global_table_from_sdk)
                .transpose(),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_global_table_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(remote_error("DescribeGlobalTable", err)),
        }
    }

    async fn create_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replication_group: Vec<Region>,
    ) -> ReconcileResult<GlobalTableDescription> {
        let replicas = replication_group
            .iter()
            .map(|replica| sdk::Replica::builder().region_name(replica.as_str()).build())
            .collect();

        let output = self
            .client(region)
            .create_global_table()
            .global_table_name(global_table_name)
            .set_replication_group(Some(replicas))
            .send()
            .await
            .map_err(|err| remote_error("CreateGlobalTable", err))?;

        let Some(description) = output.global_table_description() else {
            return Err(incomplete("created global table description"));
        };

        global_table_from_sdk(description)
    }

    async fn update_global_table(
        &self,
        region: &Region,
        global_table_name: &str,
        replica_updates: Vec<ReplicaUpdate>,
    ) -> ReconcileResult<GlobalTableDescription> {
        let updates = replica_updates
            .iter()
            .map(replica_update_to_sdk)
            .collect::<ReconcileResult<Vec<_>>>()?;

        let output = self
            .client(region)
            .update_global_table()
            .global_table_name(global_table_name)
            .set_replica_updates(Some(updates))
            .send()
            .await
            .map_err(|err| remote_error("UpdateGlobalTable", err))?;

        let Some(description) = output.global_table_description() else {
            return Err(incomplete("updated global table description"));
        };

        global_table_from_sdk(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_demand_capacity_is_not_provisioned() {
        let on_demand = sdk::ProvisionedThroughputDescription::builder()
            .read_capacity_units(0)
            .write_capacity_units(0)
            .build();
        let provisioned = sdk::ProvisionedThroughputDescription::builder()
            .read_capacity_units(5)
            .write_capacity_units(2)
            .build();

        assert_eq!(throughput_from_sdk(Some(&on_demand)), None);
        assert_eq!(
            throughput_from_sdk(Some(&provisioned)),
            Some(ProvisionedThroughput::new(5, 2))
        );
    }

    #[test]
    fn table_description_round_trips_through_sdk_model() {
        let sdk_table = sdk::TableDescription::builder()
            .table_name("orders")
            .table_arn("arn:aws:dynamodb:us-east-1:123456789012:table/orders")
            .table_status(sdk::TableStatus::Active)
            .stream_specification(
                stream_to_sdk(&StreamSpecification::new_and_old_images()).unwrap(),
            )
            .set_attribute_definitions(Some(
                attribute_definitions_to_sdk(&[AttributeDefinition::new(
                    "id",
                    ScalarAttributeType::String,
                )])
                .unwrap(),
            ))
            .set_key_schema(Some(key_schema_to_sdk(&[KeySchemaElement::hash("id")]).unwrap()))
            .build();

        let table = table_from_sdk(&sdk_table).unwrap();

        assert_eq!(table.table_name, "orders");
        assert_eq!(table.table_status, TableStatus::Active);
        assert!(table.has_replication_stream());
        assert_eq!(table.key_schema, vec![KeySchemaElement::hash("id")]);
    }
}
