use std::collections::HashSet;

use crate::types::{
    AttributeDefinition, GlobalSecondaryIndexDefinition, KeySchemaElement, LocalSecondaryIndex,
    ProvisionedThroughput, StreamSpecification, TableDescription,
};

/// Change to the global secondary indexes of one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaIndexUpdate {
    Create(GlobalSecondaryIndexDefinition),
    Delete { index_name: String },
}

impl ReplicaIndexUpdate {
    pub fn index_name(&self) -> &str {
        match self {
            ReplicaIndexUpdate::Create(definition) => &definition.index_name,
            ReplicaIndexUpdate::Delete { index_name } => index_name,
        }
    }
}

/// Request creating a replica table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub stream_specification: Option<StreamSpecification>,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexDefinition>,
}

impl CreateTableRequest {
    /// Builds a request that copies `master` to another region.
    ///
    /// Local secondary indexes are copied verbatim and every global secondary index keeps its
    /// own throughput. Indexes the master is deleting are skipped, and so are the attribute
    /// definitions only they use.
    pub fn copy_of(master: &TableDescription) -> Self {
        Self {
            table_name: master.table_name.clone(),
            attribute_definitions: master.replicated_attribute_definitions(),
            key_schema: master.key_schema.clone(),
            stream_specification: master.stream_specification.clone(),
            provisioned_throughput: master.provisioned_throughput,
            local_secondary_indexes: master.local_secondary_indexes.clone(),
            global_secondary_indexes: master
                .global_secondary_indexes
                .iter()
                .filter(|index| !index.is_deleting())
                .map(|index| index.definition())
                .collect(),
        }
    }

    /// Names of the attribute definitions that neither the table key nor any index key uses.
    pub fn unused_attribute_definitions(&self) -> Vec<&str> {
        let key_attributes: HashSet<&str> = self
            .key_schema
            .iter()
            .chain(
                self.local_secondary_indexes
                    .iter()
                    .flat_map(|index| &index.key_schema),
            )
            .chain(
                self.global_secondary_indexes
                    .iter()
                    .flat_map(|index| &index.key_schema),
            )
            .map(|element| element.attribute_name.as_str())
            .collect();

        self.attribute_definitions
            .iter()
            .map(|definition| definition.attribute_name.as_str())
            .filter(|name| !key_attributes.contains(name))
            .collect()
    }
}

/// Request patching an existing replica table.
///
/// Throughput and stream settings are never part of an update: capacity is managed outside of
/// the reconciler and the stream cannot change once a table joined a global table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTableRequest {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub global_secondary_index_updates: Vec<ReplicaIndexUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::table::table_with_indexes;
    use crate::types::{IndexStatus, Region};

    #[test]
    fn copy_skips_deleting_index_and_its_attributes() {
        let mut master = table_with_indexes(&Region::from("us-east-1"), "orders", &["x", "y"]);
        master.global_secondary_indexes[1].index_status = IndexStatus::Deleting;

        let request = CreateTableRequest::copy_of(&master);

        let index_names: Vec<&str> = request
            .global_secondary_indexes
            .iter()
            .map(|index| index.index_name.as_str())
            .collect();
        assert_eq!(index_names, vec!["x"]);
        assert!(request.unused_attribute_definitions().is_empty());
        assert!(
            request
                .attribute_definitions
                .iter()
                .all(|definition| definition.attribute_name != "y_pk")
        );
    }

    #[test]
    fn copy_of_active_table_keeps_every_attribute() {
        let master = table_with_indexes(&Region::from("us-east-1"), "orders", &["x", "y"]);

        let request = CreateTableRequest::copy_of(&master);

        assert_eq!(request.attribute_definitions, master.attribute_definitions);
        assert_eq!(request.global_secondary_indexes.len(), 2);
    }
}
