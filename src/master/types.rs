//! JSON answers of the master

use crate::volume::location::{ServerLocation, VolumeLocations};
use serde::{Deserialize, Serialize};

/// Raw `/dir/lookup` answer
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(rename = "volumeId", default)]
    pub volume_id: String,
    #[serde(default)]
    pub locations: Vec<ServerLocation>,
    #[serde(default)]
    pub error: String,
}

/// Successful volume lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub volume_id: String,
    pub locations: VolumeLocations,
}

/// `/dir/assign` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignResult {
    #[serde(rename = "fid", default)]
    pub file_id: String,
    /// Internal address of the target volume server
    #[serde(default)]
    pub url: String,
    #[serde(rename = "publicUrl", default)]
    pub public_url: String,
    /// Number of reserved ids; zero means the assign failed
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// `/submit` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(rename = "fid", default)]
    pub file_id: String,
    #[serde(rename = "fileUrl", default)]
    pub file_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Volume server answer to an upload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "eTag", default)]
    pub etag: String,
    #[serde(default)]
    pub error: String,
}

/// Optional error field of acknowledgement answers (grow, vacuum, collection delete)
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub error: String,
}

/// `/dir/status` answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Topology", default)]
    pub topology: serde_json::Value,
}

/// `/cluster/status` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(rename = "IsLeader", default)]
    pub is_leader: bool,
    #[serde(rename = "Leader", default)]
    pub leader: String,
    #[serde(rename = "Peers", default)]
    pub peers: Vec<String>,
}
