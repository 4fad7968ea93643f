use std::collections::BTreeSet;

use crate::types::Region;

/// Observed state of a global table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalTableDescription {
    pub global_table_name: String,
    pub global_table_arn: String,
    pub replication_group: BTreeSet<Region>,
}

/// Change to the replication group of a global table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReplicaUpdate {
    Create(Region),
    Delete(Region),
}
