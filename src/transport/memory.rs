use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::cluster::types::{NodeId, Peer};
use crate::storage::node::{StorageNode, StoredEntry};
use crate::transport::{PeerTransport, ReadReply, WriteAck};

/// Transport that dispatches directly to registered `StorageNode`s, no
/// sockets involved.
///
/// A node that is partitioned away, unregistered, or marked down is
/// `Unreachable`, exactly as the HTTP transport reports a dead process. Unit
/// tests build whole clusters on top of this.
#[derive(Default)]
pub struct InMemoryTransport {
    nodes: DashMap<u64, Arc<StorageNode>>,
    partitioned: DashMap<u64, ()>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node: Arc<StorageNode>) {
        self.nodes.insert(node.id().0, node);
    }

    /// Cut the network to `id`. Probes and requests fail until `heal`.
    pub fn partition(&self, id: NodeId) {
        self.partitioned.insert(id.0, ());
    }

    /// Restore the network to `id`.
    pub fn heal(&self, id: NodeId) {
        self.partitioned.remove(&id.0);
    }

    fn reachable(&self, id: NodeId) -> Option<Arc<StorageNode>> {
        if self.partitioned.contains_key(&id.0) {
            return None;
        }
        let node = self.nodes.get(&id.0)?.clone();
        if node.is_up() { Some(node) } else { None }
    }
}

#[async_trait]
impl PeerTransport for InMemoryTransport {
    async fn remote_read(&self, peer: &Peer, key: &str) -> ReadReply {
        match self.reachable(peer.id) {
            Some(node) => match node.read(key) {
                Some(entry) => ReadReply::Found(entry),
                None => ReadReply::NotFound,
            },
            None => ReadReply::Unreachable,
        }
    }

    async fn remote_write(&self, peer: &Peer, key: &str, entry: &StoredEntry) -> WriteAck {
        match self.reachable(peer.id) {
            Some(node) => {
                if node.write(key, entry.clone()) {
                    WriteAck::Accepted
                } else {
                    WriteAck::Rejected
                }
            }
            None => WriteAck::Unreachable,
        }
    }

    async fn probe(&self, peer: &Peer) -> bool {
        self.reachable(peer.id).is_some()
    }

    async fn push_sync(&self, peer: &Peer, entries: &[(String, StoredEntry)]) -> bool {
        match self.reachable(peer.id) {
            Some(node) => {
                for (key, entry) in entries {
                    node.merge_remote(key, entry.clone());
                }
                true
            }
            None => false,
        }
    }
}
