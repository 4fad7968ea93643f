use std::collections::HashSet;
use std::fmt;

/// Lifecycle status of a regional table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    /// Any status the reconciler has no special handling for, e.g. `ARCHIVED`.
    Other(String),
}

impl TableStatus {
    /// Statuses in which a master table can be copied to other regions.
    pub const COPYABLE: [TableStatus; 3] = [
        TableStatus::Creating,
        TableStatus::Active,
        TableStatus::Updating,
    ];

    /// Statuses every replica must be in before the replication group can change.
    pub const REPLICATION_READY: [TableStatus; 2] = [TableStatus::Creating, TableStatus::Active];

    pub fn as_str(&self) -> &str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Other(status) => status,
        }
    }
}

impl From<&str> for TableStatus {
    fn from(value: &str) -> Self {
        match value {
            "CREATING" => TableStatus::Creating,
            "ACTIVE" => TableStatus::Active,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            other => TableStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a global secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl IndexStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IndexStatus::Creating => "CREATING",
            IndexStatus::Active => "ACTIVE",
            IndexStatus::Updating => "UPDATING",
            IndexStatus::Deleting => "DELETING",
            IndexStatus::Other(status) => status,
        }
    }
}

impl From<&str> for IndexStatus {
    fn from(value: &str) -> Self {
        match value {
            "CREATING" => IndexStatus::Creating,
            "ACTIVE" => IndexStatus::Active,
            "UPDATING" => IndexStatus::Updating,
            "DELETING" => IndexStatus::Deleting,
            other => IndexStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamViewType {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

impl StreamViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamViewType::KeysOnly => "KEYS_ONLY",
            StreamViewType::NewImage => "NEW_IMAGE",
            StreamViewType::OldImage => "OLD_IMAGE",
            StreamViewType::NewAndOldImages => "NEW_AND_OLD_IMAGES",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "KEYS_ONLY" => Some(StreamViewType::KeysOnly),
            "NEW_IMAGE" => Some(StreamViewType::NewImage),
            "OLD_IMAGE" => Some(StreamViewType::OldImage),
            "NEW_AND_OLD_IMAGES" => Some(StreamViewType::NewAndOldImages),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpecification {
    pub stream_enabled: bool,
    pub stream_view_type: Option<StreamViewType>,
}

impl StreamSpecification {
    /// Stream required on the master table: enabled and exposing both item images.
    pub fn new_and_old_images() -> Self {
        Self {
            stream_enabled: true,
            stream_view_type: Some(StreamViewType::NewAndOldImages),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarAttributeType {
    String,
    Number,
    Binary,
}

impl ScalarAttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarAttributeType::String => "S",
            ScalarAttributeType::Number => "N",
            ScalarAttributeType::Binary => "B",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "S" => Some(ScalarAttributeType::String),
            "N" => Some(ScalarAttributeType::Number),
            "B" => Some(ScalarAttributeType::Binary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

impl AttributeDefinition {
    pub fn new(attribute_name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            attribute_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Hash,
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Hash => "HASH",
            KeyType::Range => "RANGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HASH" => Some(KeyType::Hash),
            "RANGE" => Some(KeyType::Range),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

impl KeySchemaElement {
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// Read and write capacity of a table or index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl ProvisionedThroughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionType {
    All,
    KeysOnly,
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::All => "ALL",
            ProjectionType::KeysOnly => "KEYS_ONLY",
            ProjectionType::Include => "INCLUDE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL" => Some(ProjectionType::All),
            "KEYS_ONLY" => Some(ProjectionType::KeysOnly),
            "INCLUDE" => Some(ProjectionType::Include),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection {
    pub projection_type: Option<ProjectionType>,
    pub non_key_attributes: Vec<String>,
}

impl Projection {
    pub fn all() -> Self {
        Self {
            projection_type: Some(ProjectionType::All),
            non_key_attributes: Vec::new(),
        }
    }
}

/// Local secondary index. These are fixed at table creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
}

/// Definition of a global secondary index, as sent when the index is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndexDefinition {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

/// Global secondary index as observed on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    pub index_status: IndexStatus,
}

impl GlobalSecondaryIndex {
    pub fn is_deleting(&self) -> bool {
        self.index_status == IndexStatus::Deleting
    }

    /// Returns the definition needed to create this index on another table, including its own
    /// throughput.
    pub fn definition(&self) -> GlobalSecondaryIndexDefinition {
        GlobalSecondaryIndexDefinition {
            index_name: self.index_name.clone(),
            key_schema: self.key_schema.clone(),
            projection: self.projection.clone(),
            provisioned_throughput: self.provisioned_throughput,
        }
    }
}

/// Observed state of one regional table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub table_arn: String,
    pub table_status: TableStatus,
    pub stream_specification: Option<StreamSpecification>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
}

impl TableDescription {
    /// Returns `true` if the table streams both old and new item images, which global tables
    /// require.
    pub fn has_replication_stream(&self) -> bool {
        self.stream_specification.as_ref().is_some_and(|stream| {
            stream.stream_enabled
                && stream.stream_view_type == Some(StreamViewType::NewAndOldImages)
        })
    }

    pub fn global_secondary_index(&self, index_name: &str) -> Option<&GlobalSecondaryIndex> {
        self.global_secondary_indexes
            .iter()
            .find(|index| index.index_name == index_name)
    }

    /// Attribute definitions referenced by the table key, the local secondary indexes and the
    /// global secondary indexes that are not being deleted.
    ///
    /// Tables cannot be created with attribute definitions no key uses, so only these are
    /// copied to replicas.
    pub fn replicated_attribute_definitions(&self) -> Vec<AttributeDefinition> {
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
                    .filter(|index| !index.is_deleting())
                    .flat_map(|index| &index.key_schema),
            )
            .map(|element| element.attribute_name.as_str())
            .collect();

        self.attribute_definitions
            .iter()
            .filter(|definition| key_attributes.contains(definition.attribute_name.as_str()))
            .cloned()
            .collect()
    }

    /// Compares the parts of the schema that replicas must share: the table name and the
    /// replicated attribute definitions.
    ///
    /// The order in which attributes are listed is irrelevant.
    pub fn has_same_base_schema(&self, other: &TableDescription) -> bool {
        if self.table_name != other.table_name {
            return false;
        }

        let mut ours = self.replicated_attribute_definitions();
        let mut theirs = other.replicated_attribute_definitions();
        if ours.len() != theirs.len() {
            return false;
        }

        ours.sort();
        theirs.sort();

        ours == theirs
    }
}
