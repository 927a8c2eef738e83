//! Typed request models shaped like a cluster-management API.
//!
//! Every field is optional, mirroring how update requests distinguish "not
//! set" from "set to a value".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ComponentLabel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_specs: Option<Vec<ReplicationSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentLabel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_configs: Option<Vec<CloudRegionConfig>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRegionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electable_specs: Option<HardwareSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_specs: Option<HardwareSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i32>,
    #[serde(rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<f64>,
    #[serde(rename = "diskIOPS", skip_serializing_if = "Option::is_none")]
    pub disk_iops: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_table_scan: Option<bool>,
}

/// Replication spec with only identity and zone fields set
#[allow(dead_code)]
pub fn spec(id: Option<&str>, zone_id: Option<&str>, zone_name: &str) -> ReplicationSpec {
    ReplicationSpec {
        id: id.map(str::to_string),
        zone_id: zone_id.map(str::to_string),
        zone_name: Some(zone_name.to_string()),
        region_configs: None,
    }
}

/// Cluster with one replication spec holding one region config whose
/// electable and read-only hardware specs carry the given values.
#[allow(dead_code)]
pub fn cluster_with_hardware(
    electable_disk_gb: f64,
    electable_nodes: i32,
    read_only_disk_gb: Option<f64>,
    read_only_nodes: i32,
    disk_iops: Option<i32>,
) -> ClusterDescription {
    ClusterDescription {
        replication_specs: Some(vec![ReplicationSpec {
            region_configs: Some(vec![CloudRegionConfig {
                electable_specs: Some(HardwareSpec {
                    node_count: Some(electable_nodes),
                    disk_size_gb: Some(electable_disk_gb),
                    disk_iops,
                }),
                read_only_specs: Some(HardwareSpec {
                    node_count: Some(read_only_nodes),
                    disk_size_gb: read_only_disk_gb,
                    disk_iops,
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }]),
        ..Default::default()
    }
}
