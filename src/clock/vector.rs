use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cluster::types::NodeId;

/// Causal relation between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    /// Every component <= the other's, at least one strictly smaller.
    Before,
    /// Symmetric case of `Before`.
    After,
    /// Some component larger on each side.
    Concurrent,
    /// Component-wise identical.
    Equal,
}

/// Per-key vector clock: node id -> update counter.
///
/// Missing components read as 0, so vectors of different length (a node that
/// joined later) compare without special cases. Serialized as a JSON object
/// keyed by the decimal node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock(BTreeMap<u64, u64>);

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter for `id`, 0 when the node never updated this key.
    pub fn get(&self, id: NodeId) -> u64 {
        self.0.get(&id.0).copied().unwrap_or(0)
    }

    /// Record one local event at `id`.
    pub fn increment(&mut self, id: NodeId) {
        *self.0.entry(id.0).or_insert(0) += 1;
    }

    /// Component-wise maximum of the two clocks. Pure, neither input changes.
    pub fn merged(&self, other: &VectorClock) -> VectorClock {
        let mut result = self.0.clone();
        for (&id, &count) in &other.0 {
            let slot = result.entry(id).or_insert(0);
            if count > *slot {
                *slot = count;
            }
        }
        VectorClock(result)
    }

    /// Highest node id with a non-zero component. Used as the deterministic
    /// tie-breaker when two concurrent updates carry the same timestamp.
    pub fn max_contributor(&self) -> Option<NodeId> {
        self.0
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&id, _)| NodeId(id))
            .next_back()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Causal comparison of two clocks. Pure function of the two vectors, the
/// result does not depend on which node evaluates it.
pub fn compare(a: &VectorClock, b: &VectorClock) -> Causality {
    let mut less = false;
    let mut greater = false;

    for &id in a.0.keys().chain(b.0.keys()) {
        let left = a.0.get(&id).copied().unwrap_or(0);
        let right = b.0.get(&id).copied().unwrap_or(0);

        if left < right {
            less = true;
        } else if left > right {
            greater = true;
        }
    }

    match (less, greater) {
        (false, false) => Causality::Equal,
        (true, false) => Causality::Before,
        (false, true) => Causality::After,
        (true, true) => Causality::Concurrent,
    }
}
