//! Peer Transport Module
//!
//! Abstraction for talking to remote replicas, with failure-as-signal
//! semantics.
//!
//! ## Core Concepts
//! - **Bounded calls**: every remote call carries its own timeout; nothing in
//!   the cluster blocks indefinitely on a peer.
//! - **Unreachable collapse**: any transport-level error (refused connection,
//!   timeout, bad reply) becomes `Unreachable`. Callers never learn whether a
//!   peer was slow or down, and the transport itself never retries; retry
//!   policy lives in the coordinator and the handoff manager.
//! - **Swappable backend**: `HttpPeerTransport` is the real thing,
//!   `InMemoryTransport` wires `StorageNode`s together directly so quorum,
//!   handoff and sync logic are testable without sockets.

use async_trait::async_trait;

use crate::cluster::types::Peer;
use crate::storage::node::StoredEntry;

pub mod http;
pub mod memory;

pub use http::HttpPeerTransport;
pub use memory::InMemoryTransport;

/// Outcome of a remote read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadReply {
    /// The peer answered with its local version.
    Found(StoredEntry),
    /// The peer answered; it has no value for the key.
    NotFound,
    /// The peer did not answer in time.
    Unreachable,
}

/// Outcome of a remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    /// The peer applied the write.
    Accepted,
    /// The peer already holds a version at least as new.
    Rejected,
    /// The peer did not answer in time.
    Unreachable,
}

/// Sends read/write/probe requests to one specific peer.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Fetch the peer's local version of `key`.
    async fn remote_read(&self, peer: &Peer, key: &str) -> ReadReply;

    /// Push one timestamped write to the peer.
    async fn remote_write(&self, peer: &Peer, key: &str, entry: &StoredEntry) -> WriteAck;

    /// Cheap liveness check with a short timeout.
    async fn probe(&self, peer: &Peer) -> bool;

    /// Push a full anti-entropy batch. Returns whether the peer accepted it.
    async fn push_sync(&self, peer: &Peer, entries: &[(String, StoredEntry)]) -> bool;
}
