use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::vector::{Causality, VectorClock, compare};
use crate::cluster::types::NodeId;

/// One versioned value as held by a single replica.
///
/// The timestamp drives last-writer-wins replication; the vector clock rides
/// along so the anti-entropy path can tell causally ordered updates from
/// concurrent ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: serde_json::Value,
    /// Microseconds since the epoch, strictly increasing per key on any
    /// single node.
    pub timestamp: u64,
    #[serde(default)]
    pub vector_clock: VectorClock,
}

/// How an anti-entropy merge settled a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Key was absent locally, remote adopted.
    New,
    /// Remote causally dominates, remote adopted.
    AdoptedRemote,
    /// Local dominates or equals, nothing changed.
    KeptLocal,
    /// Concurrent updates: clocks merged, value picked by timestamp.
    ResolvedConflict { adopted_remote: bool },
    /// Node is marked down, entry untouched.
    Unavailable,
}

/// Authoritative last-writer-wins store for one replica.
///
/// Every node holds the full key space. A write is accepted only if its
/// timestamp strictly exceeds the stored one; the compare-then-write step is
/// atomic per key through the map's entry API. The up/down flag models node
/// availability: a down node answers nothing but keeps its data, so the
/// stored state survives a down period.
pub struct StorageNode {
    id: NodeId,
    entries: DashMap<String, StoredEntry>,
    up: AtomicBool,
}

impl StorageNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            entries: DashMap::new(),
            up: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    pub fn mark_down(&self) {
        self.up.store(false, Ordering::SeqCst);
        tracing::warn!("Node {} marked DOWN", self.id);
    }

    pub fn mark_up(&self) {
        self.up.store(true, Ordering::SeqCst);
        tracing::info!("Node {} marked UP", self.id);
    }

    /// Current entry for `key`. `None` when the key is absent or the node is
    /// down. Side-effect-free.
    pub fn read(&self, key: &str) -> Option<StoredEntry> {
        if !self.is_up() {
            return None;
        }
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Apply a timestamped write. Accepted iff the node is up and the
    /// timestamp strictly exceeds the stored one (0 for an absent key).
    /// Stale writes are silent no-ops returning `false`, not errors.
    pub fn write(&self, key: &str, entry: StoredEntry) -> bool {
        if !self.is_up() {
            return false;
        }

        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut current) => {
                if entry.timestamp > current.get().timestamp {
                    current.insert(entry);
                    true
                } else {
                    tracing::debug!(
                        "Node {}: rejected stale write for '{}' (incoming {}, stored {})",
                        self.id,
                        key,
                        entry.timestamp,
                        current.get().timestamp
                    );
                    false
                }
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                if entry.timestamp > 0 {
                    slot.insert(entry);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Snapshot of every entry, for the anti-entropy push.
    pub fn entries(&self) -> Vec<(String, StoredEntry)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge one remote entry by causal order, for the sync path.
    ///
    /// Causally newer remote state replaces local state; concurrent updates
    /// merge their clocks and keep the value with the larger timestamp (ties
    /// go to the update whose clock carries the higher node id, as seen from
    /// this node). The stored timestamp never decreases, so the
    /// last-writer-wins invariant holds on this path too.
    pub fn merge_remote(&self, key: &str, remote: StoredEntry) -> MergeOutcome {
        if !self.is_up() {
            return MergeOutcome::Unavailable;
        }

        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(remote);
                MergeOutcome::New
            }
            dashmap::mapref::entry::Entry::Occupied(mut current) => {
                let local = current.get();
                match compare(&local.vector_clock, &remote.vector_clock) {
                    Causality::Before => {
                        let mut adopted = remote;
                        adopted.timestamp = adopted.timestamp.max(local.timestamp);
                        current.insert(adopted);
                        MergeOutcome::AdoptedRemote
                    }
                    Causality::After | Causality::Equal => MergeOutcome::KeptLocal,
                    Causality::Concurrent => {
                        let merged_clock = local.vector_clock.merged(&remote.vector_clock);
                        let adopted_remote = match remote.timestamp.cmp(&local.timestamp) {
                            std::cmp::Ordering::Greater => true,
                            std::cmp::Ordering::Less => false,
                            std::cmp::Ordering::Equal => remote
                                .vector_clock
                                .max_contributor()
                                .is_some_and(|c| self.id < c),
                        };

                        let mut next = if adopted_remote {
                            remote.clone()
                        } else {
                            local.clone()
                        };
                        next.timestamp = local.timestamp.max(remote.timestamp);
                        next.vector_clock = merged_clock;
                        current.insert(next);

                        MergeOutcome::ResolvedConflict { adopted_remote }
                    }
                }
            }
        }
    }
}
