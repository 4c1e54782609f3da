//! Error types for the replicated store.

use thiserror::Error;

use crate::cluster::types::{ConsistencyLevel, Operation};

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, KvError>;

/// Client-facing failure taxonomy.
///
/// Peer-level failures (timeouts, stale-write rejections) are absorbed while
/// aggregating replies and never surface here directly; only the final
/// aggregate outcome does.
#[derive(Debug, Error)]
pub enum KvError {
    /// Fewer replicas answered than the consistency level requires.
    #[error("failed to reach {level} {op} quorum: needed {needed}, got {got}")]
    QuorumUnreachable {
        level: ConsistencyLevel,
        op: Operation,
        needed: usize,
        got: usize,
    },

    /// Enough replicas answered, none of them holds the key.
    #[error("key not found")]
    NotFound,

    /// Rejected at startup, the node never serves with a broken quorum setup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing key or value in a client request. No side effects.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
