use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cluster::types::{ConsistencyLevel, NodeId, Operation, Peer};
use crate::cluster::view::ClusterView;
use crate::error::{KvError, Result};
use crate::handoff::manager::HintedHandoffManager;
use crate::storage::node::{StorageNode, StoredEntry};
use crate::transport::{PeerTransport, ReadReply, WriteAck};

/// Outcome of a successful quorum read.
#[derive(Debug, Clone)]
pub struct QuorumRead {
    pub value: serde_json::Value,
    pub timestamp: u64,
    /// Replica that held the chosen (newest) version.
    pub source_node: NodeId,
    pub level: ConsistencyLevel,
}

/// Outcome of a successful quorum write.
#[derive(Debug, Clone)]
pub struct QuorumWrite {
    pub timestamp: u64,
    /// Replicas that confirmed the write.
    pub confirmed_nodes: usize,
    pub level: ConsistencyLevel,
}

/// Coordinates client reads and writes across the local store and every
/// peer.
///
/// Stateless between operations apart from the timestamp source: a per-node
/// counter seeded from wall-clock microseconds that never regresses, so
/// consecutive writes through one coordinator always carry strictly
/// increasing timestamps even if the system clock steps backwards.
pub struct QuorumCoordinator<T: PeerTransport> {
    view: ClusterView,
    local: Arc<StorageNode>,
    transport: Arc<T>,
    handoff: Arc<HintedHandoffManager<T>>,
    last_timestamp: AtomicU64,
}

impl<T: PeerTransport> QuorumCoordinator<T> {
    pub fn new(
        view: ClusterView,
        local: Arc<StorageNode>,
        transport: Arc<T>,
        handoff: Arc<HintedHandoffManager<T>>,
    ) -> Self {
        Self {
            view,
            local,
            transport,
            handoff,
            last_timestamp: AtomicU64::new(0),
        }
    }

    pub fn view(&self) -> &ClusterView {
        &self.view
    }

    /// Quorum read: fan out to every replica, pick the newest version among
    /// the replies, repair stale replicas in the background.
    pub async fn read(&self, key: &str, level: ConsistencyLevel) -> Result<QuorumRead> {
        let required = self.view.required_quorum(level, Operation::Read);
        let replies = self.collect_reads(key).await;

        let responded = replies
            .iter()
            .filter(|(_, reply)| !matches!(reply, ReadReply::Unreachable))
            .count();
        let found: Vec<(NodeId, StoredEntry)> = replies
            .iter()
            .filter_map(|(id, reply)| match reply {
                ReadReply::Found(entry) => Some((*id, entry.clone())),
                _ => None,
            })
            .collect();

        if found.len() < required {
            // Enough replicas answered but none of them carries the key:
            // that is an absent key, not a quorum failure.
            if responded >= required && found.is_empty() {
                return Err(KvError::NotFound);
            }
            tracing::warn!(
                "Read quorum {} not reached for '{}': {} value(s) from {} response(s)",
                level,
                key,
                found.len(),
                responded
            );
            return Err(KvError::QuorumUnreachable {
                level,
                op: Operation::Read,
                needed: required,
                got: found.len(),
            });
        }

        // Newest timestamp wins. Which replica wins an exact tie is
        // unspecified; equal timestamps carry equal last-writer-wins state.
        let Some((source_node, chosen)) = found
            .iter()
            .max_by_key(|(_, entry)| entry.timestamp)
            .cloned()
        else {
            return Err(KvError::NotFound);
        };

        let stale_peers: Vec<Peer> = found
            .iter()
            .filter(|(id, entry)| {
                *id != self.view.local_id() && entry.timestamp < chosen.timestamp
            })
            .filter_map(|(id, _)| self.view.peer(*id).cloned())
            .collect();
        if !stale_peers.is_empty() {
            self.spawn_read_repair(key.to_string(), chosen.clone(), stale_peers);
        }

        Ok(QuorumRead {
            value: chosen.value,
            timestamp: chosen.timestamp,
            source_node,
            level,
        })
    }

    /// Quorum write: stamp the value, fan out to every replica, hand hints
    /// to the handoff manager for peers that did not answer.
    pub async fn write(
        &self,
        key: &str,
        value: serde_json::Value,
        level: ConsistencyLevel,
    ) -> Result<QuorumWrite> {
        let required = self.view.required_quorum(level, Operation::Write);
        let timestamp = self.next_timestamp();

        let mut vector_clock = self
            .local
            .read(key)
            .map(|entry| entry.vector_clock)
            .unwrap_or_default();
        vector_clock.increment(self.view.local_id());

        let entry = StoredEntry {
            value: value.clone(),
            timestamp,
            vector_clock,
        };

        let acks = self.collect_writes(key, &entry).await;
        let confirmed = acks
            .iter()
            .filter(|(_, ack)| matches!(ack, WriteAck::Accepted))
            .count();

        if confirmed < required {
            // Already-applied replicas keep the write; there is no
            // compensating transaction in this model.
            tracing::warn!(
                "Write quorum {} not reached for '{}': {} confirmation(s), needed {}",
                level,
                key,
                confirmed,
                required
            );
            return Err(KvError::QuorumUnreachable {
                level,
                op: Operation::Write,
                needed: required,
                got: confirmed,
            });
        }

        for (id, ack) in &acks {
            if matches!(ack, WriteAck::Unreachable) && *id != self.view.local_id() {
                self.handoff.stash(*id, key, &entry);
            }
        }

        Ok(QuorumWrite {
            timestamp,
            confirmed_nodes: confirmed,
            level,
        })
    }

    /// Fan a read out to the local store and every peer, collecting every
    /// reply. Each peer call is bounded by the transport timeout.
    async fn collect_reads(&self, key: &str) -> Vec<(NodeId, ReadReply)> {
        let local_reply = if !self.local.is_up() {
            ReadReply::Unreachable
        } else {
            match self.local.read(key) {
                Some(entry) => ReadReply::Found(entry),
                None => ReadReply::NotFound,
            }
        };

        let mut replies = vec![(self.view.local_id(), local_reply)];

        let mut calls = tokio::task::JoinSet::new();
        for peer in self.view.peers() {
            let transport = self.transport.clone();
            let peer = peer.clone();
            let key = key.to_string();
            calls.spawn(async move { (peer.id, transport.remote_read(&peer, &key).await) });
        }
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok(reply) => replies.push(reply),
                Err(e) => tracing::error!("Read fan-out task failed: {}", e),
            }
        }

        replies
    }

    async fn collect_writes(&self, key: &str, entry: &StoredEntry) -> Vec<(NodeId, WriteAck)> {
        let local_ack = if !self.local.is_up() {
            WriteAck::Unreachable
        } else if self.local.write(key, entry.clone()) {
            WriteAck::Accepted
        } else {
            WriteAck::Rejected
        };

        let mut acks = vec![(self.view.local_id(), local_ack)];

        let mut calls = tokio::task::JoinSet::new();
        for peer in self.view.peers() {
            let transport = self.transport.clone();
            let peer = peer.clone();
            let key = key.to_string();
            let entry = entry.clone();
            calls.spawn(async move {
                (peer.id, transport.remote_write(&peer, &key, &entry).await)
            });
        }
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok(ack) => acks.push(ack),
                Err(e) => tracing::error!("Write fan-out task failed: {}", e),
            }
        }

        acks
    }

    /// Push the chosen version at replicas that answered with an older
    /// timestamp. Fire-and-forget: the client response never waits on it and
    /// failures are logged, not retried.
    fn spawn_read_repair(&self, key: String, chosen: StoredEntry, stale_peers: Vec<Peer>) {
        let transport = self.transport.clone();

        tokio::spawn(async move {
            tracing::info!(
                "Read repair for '{}': updating {} stale node(s)",
                key,
                stale_peers.len()
            );

            for peer in stale_peers {
                match transport.remote_write(&peer, &key, &chosen).await {
                    WriteAck::Accepted => {
                        tracing::debug!("Read repair updated node {} for '{}'", peer.id, key);
                    }
                    WriteAck::Rejected => {
                        tracing::debug!(
                            "Read repair skipped node {}, it already caught up",
                            peer.id
                        );
                    }
                    WriteAck::Unreachable => {
                        tracing::warn!(
                            "Read repair could not reach node {} for '{}'",
                            peer.id,
                            key
                        );
                    }
                }
            }
        });
    }

    /// Strictly increasing per-node timestamp, seeded from wall-clock
    /// microseconds. Never regresses, so a backwards clock step cannot make
    /// this node issue a timestamp its replicas would reject as stale.
    fn next_timestamp(&self) -> u64 {
        let now = now_micros();
        let mut last = self.last_timestamp.load(Ordering::Relaxed);

        loop {
            let candidate = now.max(last + 1);
            match self.last_timestamp.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
