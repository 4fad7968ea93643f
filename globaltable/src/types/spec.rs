use crate::types::Region;

/// Desired state of a global table, derived from the properties of a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredGlobalTableSpec {
    pub table_name: String,
    /// Regions of the replication group, master region included. Unique, in the order they
    /// were first listed.
    pub regions: Vec<Region>,
    /// Whether replica tables are deleted when their region leaves the group.
    pub delete_unneeded_tables: bool,
    /// Opaque marker of the deployment revision that produced this state.
    pub last_stack_update: Option<String>,
}

impl DesiredGlobalTableSpec {
    pub fn new<I, R>(table_name: impl Into<String>, regions: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Region>,
    {
        let mut unique: Vec<Region> = Vec::new();
        for region in regions {
            let region = region.into();
            if !unique.contains(&region) {
                unique.push(region);
            }
        }

        Self {
            table_name: table_name.into(),
            regions: unique,
            delete_unneeded_tables: false,
            last_stack_update: None,
        }
    }

    pub fn with_delete_unneeded_tables(mut self, delete_unneeded_tables: bool) -> Self {
        self.delete_unneeded_tables = delete_unneeded_tables;
        self
    }

    pub fn with_last_stack_update(mut self, last_stack_update: impl Into<String>) -> Self {
        self.last_stack_update = Some(last_stack_update.into());
        self
    }

    /// Regions holding replica tables, i.e. every region except `master_region`.
    pub fn replica_regions(&self, master_region: &Region) -> Vec<Region> {
        self.regions
            .iter()
            .filter(|region| *region != master_region)
            .cloned()
            .collect()
    }
}

/// Result of a successful reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Stable identifier of the logical resource. For global tables this is the table name.
    pub physical_resource_id: String,
    pub global_table_arn: Option<String>,
}

impl ReconcileOutcome {
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            global_table_arn: None,
        }
    }

    pub fn with_global_table_arn(mut self, global_table_arn: impl Into<String>) -> Self {
        self.global_table_arn = Some(global_table_arn.into());
        self
    }
}
