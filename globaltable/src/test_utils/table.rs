use config::shared::{ReconcilerConfig, WaitConfig};

use crate::store::memory::{MemoryTableStore, memory_table_arn};
use crate::types::{
    AttributeDefinition, CreateTableRequest, GlobalSecondaryIndex, IndexStatus, KeySchemaElement,
    Projection, Region, ScalarAttributeType, StreamSpecification, TableDescription, TableStatus,
};

/// Reconciler configuration with no propagation delay and millisecond waits.
pub fn test_reconciler_config(master_region: &str) -> ReconcilerConfig {
    ReconcilerConfig {
        master_region: master_region.to_string(),
        propagation_delay_ms: 0,
        table_status_wait: WaitConfig {
            max_attempts: 10,
            initial_delay_ms: 1,
            backoff_multiplier: 1.5,
            max_delay_ms: 10,
        },
        tags_visible_wait: WaitConfig {
            max_attempts: 15,
            initial_delay_ms: 1,
            backoff_multiplier: 1.5,
            max_delay_ms: 10,
        },
    }
}

/// Active global secondary index keyed on `<index_name>_pk`.
pub fn global_index(index_name: &str) -> GlobalSecondaryIndex {
    GlobalSecondaryIndex {
        index_name: index_name.to_string(),
        key_schema: vec![KeySchemaElement::hash(format!("{index_name}_pk"))],
        projection: Projection::all(),
        provisioned_throughput: None,
        index_status: IndexStatus::Active,
    }
}

/// Active table keyed on `id` with a replication stream and one global index per name.
pub fn table_with_indexes(region: &Region, table_name: &str, indexes: &[&str]) -> TableDescription {
    let mut attribute_definitions = vec![AttributeDefinition::new(
        "id",
        ScalarAttributeType::String,
    )];
    attribute_definitions.extend(indexes.iter().map(|index_name| {
        AttributeDefinition::new(format!("{index_name}_pk"), ScalarAttributeType::String)
    }));

    TableDescription {
        table_name: table_name.to_string(),
        table_arn: memory_table_arn(region, table_name),
        table_status: TableStatus::Active,
        stream_specification: Some(StreamSpecification::new_and_old_images()),
        attribute_definitions,
        key_schema: vec![KeySchemaElement::hash("id")],
        provisioned_throughput: None,
        local_secondary_indexes: Vec::new(),
        global_secondary_indexes: indexes.iter().map(|name| global_index(name)).collect(),
    }
}

/// Request creating a copy of an index-less table.
pub fn replica_request(table_name: &str) -> CreateTableRequest {
    CreateTableRequest::copy_of(&table_with_indexes(
        &Region::from("us-east-1"),
        table_name,
        &[],
    ))
}

/// Inserts an index-less table named `table_name` in every region.
pub async fn insert_tables(store: &MemoryTableStore, table_name: &str, regions: &[Region]) {
    for region in regions {
        store
            .insert_table(region, table_with_indexes(region, table_name, &[]))
            .await;
    }
}
