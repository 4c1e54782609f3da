use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::cluster::types::{NodeId, Peer};
use crate::cluster::view::ClusterView;
use crate::storage::node::StoredEntry;
use crate::transport::{PeerTransport, WriteAck};

/// A write buffered for one unreachable target node.
#[derive(Debug, Clone, PartialEq)]
pub struct HintRecord {
    pub key: String,
    pub entry: StoredEntry,
}

/// Buffers writes for unreachable peers and redelivers them once the peer
/// answers a probe again.
///
/// Queues are unbounded, as in the reference design; a long outage
/// accumulates hints without limit. The single background loop means at most
/// one drain is in flight per target, and each drain takes the whole queue
/// under the lock, so stashes racing a drain land in a fresh queue for the
/// next cycle.
pub struct HintedHandoffManager<T: PeerTransport> {
    view: ClusterView,
    transport: Arc<T>,
    hints: Mutex<HashMap<NodeId, Vec<HintRecord>>>,
    interval: Duration,
}

impl<T: PeerTransport> HintedHandoffManager<T> {
    pub fn new(view: ClusterView, transport: Arc<T>, interval: Duration) -> Self {
        Self {
            view,
            transport,
            hints: Mutex::new(HashMap::new()),
            interval,
        }
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<NodeId, Vec<HintRecord>>> {
        match self.hints.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue a write for later delivery to `target`.
    pub fn stash(&self, target: NodeId, key: &str, entry: &StoredEntry) {
        self.queues().entry(target).or_default().push(HintRecord {
            key: key.to_string(),
            entry: entry.clone(),
        });

        tracing::info!("Node {} unavailable, stashed hint for key '{}'", target, key);
    }

    /// Number of hints waiting for `target`.
    pub fn pending(&self, target: NodeId) -> usize {
        self.queues().get(&target).map(|q| q.len()).unwrap_or(0)
    }

    fn pending_targets(&self) -> Vec<NodeId> {
        self.queues()
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(&target, _)| target)
            .collect()
    }

    /// Take the whole queue for `target`, atomically.
    fn drain(&self, target: NodeId) -> Vec<HintRecord> {
        self.queues().remove(&target).unwrap_or_default()
    }

    fn requeue(&self, target: NodeId, records: Vec<HintRecord>) {
        self.queues().entry(target).or_default().extend(records);
    }

    /// Background loop: probe targets with pending hints every interval and
    /// redeliver where possible. Never returns, never panics the process.
    pub async fn run(self: Arc<Self>) {
        tracing::info!("Hinted handoff loop started (interval {:?})", self.interval);
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;
            self.deliver_cycle().await;
        }
    }

    /// One probe-and-redeliver pass over every target with pending hints.
    /// Public so the loop body is testable without waiting on the interval.
    pub async fn deliver_cycle(&self) {
        for target in self.pending_targets() {
            let Some(peer) = self.view.peer(target).cloned() else {
                tracing::warn!("Dropping hints for unknown node {}", target);
                self.drain(target);
                continue;
            };

            if !self.transport.probe(&peer).await {
                tracing::debug!("Node {} still down, keeping hints", target);
                continue;
            }

            self.deliver(&peer).await;
        }
    }

    async fn deliver(&self, peer: &Peer) {
        let records = self.drain(peer.id);
        if records.is_empty() {
            return;
        }

        let total = records.len();
        tracing::info!("Delivering {} hint(s) to node {}", total, peer.id);

        let mut delivered = 0;
        let mut undeliverable = Vec::new();

        for record in records {
            match self
                .transport
                .remote_write(peer, &record.key, &record.entry)
                .await
            {
                WriteAck::Accepted => delivered += 1,
                WriteAck::Rejected => {
                    // The target already holds something newer; the hint is
                    // obsolete and can be dropped.
                    delivered += 1;
                    tracing::debug!(
                        "Hint for key '{}' superseded on node {}",
                        record.key,
                        peer.id
                    );
                }
                WriteAck::Unreachable => undeliverable.push(record),
            }
        }

        if !undeliverable.is_empty() {
            tracing::warn!(
                "Node {} went away mid-delivery, requeueing {} hint(s)",
                peer.id,
                undeliverable.len()
            );
            self.requeue(peer.id, undeliverable);
        }

        tracing::info!(
            "Hint delivery to node {} complete: {}/{} settled",
            peer.id,
            delivered,
            total
        );
    }
}
