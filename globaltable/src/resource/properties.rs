//! Normalization of raw resource properties into a [`DesiredGlobalTableSpec`].
//!
//! Templates describe the replication group in one of several shapes. All of them end up as
//! an ordered, deduplicated list of regions.

use serde::Deserialize;
use serde_json::Value;

use crate::bail;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::types::{DesiredGlobalTableSpec, Region};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProperties {
    global_table_name: Option<String>,
    replication_group: Option<Vec<RawReplica>>,
    deployment_regions: Option<Vec<RawDeploymentRegion>>,
    regions: Option<Vec<RawDeploymentRegion>>,
    delete_unneeded_tables: Option<Value>,
    last_stack_update: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawReplica {
    #[serde(rename = "RegionName")]
    region_name: String,
}

#[derive(Debug, Deserialize)]
struct RawDeploymentRegion {
    region: String,
}

/// Which alternative list of regions, if any, replaces `ReplicationGroup`.
#[derive(Debug, Clone, Copy)]
enum RegionListSource {
    DeploymentRegions,
    Regions,
}

/// Normalizes the properties of a managed global table.
///
/// `DeploymentRegions` takes precedence over `ReplicationGroup`. `DeleteUnneededTables` is only
/// enabled by the string `"true"`; the boolean `true` is accepted as well, although templates
/// always deliver properties as strings. When `require_revision` is set, a non-empty
/// `LastStackUpdate` must be present.
pub fn normalize_global_table_properties(
    properties: &Value,
    require_revision: bool,
) -> ReconcileResult<DesiredGlobalTableSpec> {
    let raw = parse(properties)?;

    let delete_unneeded_tables = match &raw.delete_unneeded_tables {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag == "true",
        _ => false,
    };

    let last_stack_update = raw.last_stack_update.as_ref().and_then(revision_marker);
    if require_revision && last_stack_update.is_none() {
        bail!(
            ErrorKind::InvalidProperties,
            "You must supply the LastStackUpdate property for global table resources"
        );
    }

    let table_name = table_name(&raw)?;
    let regions = regions(raw, RegionListSource::DeploymentRegions)?;

    let mut desired = DesiredGlobalTableSpec::new(table_name, regions)
        .with_delete_unneeded_tables(delete_unneeded_tables);
    desired.last_stack_update = last_stack_update;

    Ok(desired)
}

/// Normalizes the properties of a global table whose replicas are provisioned elsewhere.
///
/// `Regions` takes precedence over `ReplicationGroup`; every other property is ignored.
pub fn normalize_simple_global_table_properties(
    properties: &Value,
) -> ReconcileResult<DesiredGlobalTableSpec> {
    let raw = parse(properties)?;
    let table_name = table_name(&raw)?;
    let regions = regions(raw, RegionListSource::Regions)?;

    Ok(DesiredGlobalTableSpec::new(table_name, regions))
}

/// Reads only `GlobalTableName`, for requests that need nothing else.
pub fn global_table_name(properties: &Value) -> ReconcileResult<String> {
    let raw = parse(properties)?;
    table_name(&raw)
}

fn parse(properties: &Value) -> ReconcileResult<RawProperties> {
    if !properties.is_object() {
        bail!(
            ErrorKind::InvalidProperties,
            "Resource properties must be an object",
            properties.to_string()
        );
    }

    serde_json::from_value(properties.clone()).map_err(|err| {
        reconcile_error!(
            ErrorKind::InvalidProperties,
            "Resource properties are malformed",
            err.to_string(),
            source: err
        )
    })
}

fn table_name(raw: &RawProperties) -> ReconcileResult<String> {
    match raw.global_table_name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(reconcile_error!(
            ErrorKind::InvalidProperties,
            "GlobalTableName is missing"
        )),
    }
}

fn regions(raw: RawProperties, source: RegionListSource) -> ReconcileResult<Vec<Region>> {
    let alternative = match source {
        RegionListSource::DeploymentRegions => raw.deployment_regions,
        RegionListSource::Regions => raw.regions,
    };

    if let Some(alternative) = alternative {
        return Ok(alternative
            .into_iter()
            .map(|entry| Region::new(entry.region))
            .collect());
    }

    match raw.replication_group {
        Some(group) => Ok(group
            .into_iter()
            .map(|replica| Region::new(replica.region_name))
            .collect()),
        None => Err(reconcile_error!(
            ErrorKind::InvalidProperties,
            "The replication group is missing",
            match source {
                RegionListSource::DeploymentRegions => {
                    "expected ReplicationGroup or DeploymentRegions"
                }
                RegionListSource::Regions => "expected ReplicationGroup or Regions",
            }
        )),
    }
}

/// Revision markers are opaque; any non-empty scalar counts.
fn revision_marker(value: &Value) -> Option<String> {
    match value {
        Value::String(marker) if !marker.is_empty() => Some(marker.clone()),
        Value::Number(marker) => Some(marker.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
