//! Cluster Wire Protocol
//!
//! Defines the HTTP endpoints and Data Transfer Objects (DTOs) used at the
//! cluster boundary: client-facing GET/PUT plus the internal replica routes
//! (read, write, anti-entropy sync).
//!
//! These structures are serialized as JSON and sent over HTTP between clients
//! and nodes, and between the nodes themselves.

use serde::{Deserialize, Serialize};

use crate::clock::vector::VectorClock;
use crate::cluster::types::NodeId;
use crate::storage::node::StoredEntry;

// --- API Endpoints ---

/// Public endpoint for client reads (`GET /value/{key}`) and writes
/// (`PUT /value`).
pub const ENDPOINT_VALUE: &str = "/value";
/// Internal endpoint answering a replica's local state for one key.
pub const ENDPOINT_INTERNAL_READ: &str = "/internal/read";
/// Internal endpoint applying a timestamped write to one replica.
pub const ENDPOINT_INTERNAL_WRITE: &str = "/internal/write";
/// Internal endpoint receiving an anti-entropy batch.
pub const ENDPOINT_INTERNAL_SYNC: &str = "/internal/sync";

// --- Client-facing DTOs ---

/// Client write request. `consistency` is optional and defaults to QUORUM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPutRequest {
    pub key: String,
    pub value: Option<serde_json::Value>,
    pub consistency: Option<String>,
}

/// Successful client write acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientPutResponse {
    pub status: String,
    pub key: String,
    pub value: serde_json::Value,
    pub timestamp: u64,
    /// Number of replicas that confirmed the write.
    pub confirmed_nodes: usize,
    pub consistency_level: String,
}

/// Successful client read.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientGetResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub timestamp: u64,
    /// Replica whose reply carried the chosen (newest) version.
    pub source_node: NodeId,
    pub consistency_level: String,
}

/// Error body for 4xx/5xx client responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Internal (node-to-node) DTOs ---

/// Reply to an internal read: the replica's local version of one key.
#[derive(Debug, Serialize, Deserialize)]
pub struct InternalReadResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub timestamp: u64,
    #[serde(default)]
    pub vector_clock: VectorClock,
}

/// A timestamped write pushed to one replica (quorum fan-out, read repair
/// and hint redelivery all use this shape).
#[derive(Debug, Serialize, Deserialize)]
pub struct InternalWriteRequest {
    pub key: String,
    pub value: serde_json::Value,
    pub timestamp: u64,
    #[serde(default)]
    pub vector_clock: VectorClock,
}

/// Whether the replica applied the write or already held a newer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalWriteStatus {
    Success,
    Outdated,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InternalWriteResponse {
    pub status: InternalWriteStatus,
}

/// One key's state inside an anti-entropy batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub timestamp: u64,
    #[serde(default)]
    pub vector_clock: VectorClock,
}

/// Full-state push from one peer.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncRequest {
    pub entries: Vec<SyncEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub status: String,
}

impl From<InternalWriteRequest> for StoredEntry {
    fn from(req: InternalWriteRequest) -> Self {
        StoredEntry {
            value: req.value,
            timestamp: req.timestamp,
            vector_clock: req.vector_clock,
        }
    }
}

impl SyncEntry {
    pub fn from_pair(key: String, entry: StoredEntry) -> Self {
        Self {
            key,
            value: entry.value,
            timestamp: entry.timestamp,
            vector_clock: entry.vector_clock,
        }
    }

    pub fn into_pair(self) -> (String, StoredEntry) {
        (
            self.key,
            StoredEntry {
                value: self.value,
                timestamp: self.timestamp,
                vector_clock: self.vector_clock,
            },
        )
    }
}
