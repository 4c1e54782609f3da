//! Anti-Entropy Sync Tests
//!
//! Validates the push loop and the receiver-side causal merge, including
//! conflict resolution between concurrent writes on two replicas.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::clock::vector::VectorClock;
    use crate::cluster::types::{NodeId, Peer};
    use crate::cluster::view::ClusterView;
    use crate::storage::node::{StorageNode, StoredEntry};
    use crate::sync::manager::{SyncManager, apply_entries};
    use crate::transport::InMemoryTransport;

    fn entry_with_clock(
        value: serde_json::Value,
        timestamp: u64,
        clock_pairs: &[(u64, u64)],
    ) -> StoredEntry {
        let mut vector_clock = VectorClock::new();
        for &(id, count) in clock_pairs {
            for _ in 0..count {
                vector_clock.increment(NodeId(id));
            }
        }
        StoredEntry {
            value,
            timestamp,
            vector_clock,
        }
    }

    /// Two nodes; the sync manager runs on node 1 and pushes to node 2.
    fn pair() -> (
        Arc<SyncManager<InMemoryTransport>>,
        Arc<StorageNode>,
        Arc<StorageNode>,
        Arc<InMemoryTransport>,
    ) {
        let peers = vec![Peer {
            id: NodeId(2),
            addr: "127.0.0.1:7002".parse().unwrap(),
        }];
        let view = ClusterView::new(NodeId(1), peers, 1, 1).unwrap();

        let local = Arc::new(StorageNode::new(NodeId(1)));
        let remote = Arc::new(StorageNode::new(NodeId(2)));
        let transport = Arc::new(InMemoryTransport::new());
        transport.register(local.clone());
        transport.register(remote.clone());

        let manager = Arc::new(SyncManager::new(
            view,
            local.clone(),
            transport.clone(),
            Duration::from_millis(50),
        ));

        (manager, local, remote, transport)
    }

    #[tokio::test]
    async fn test_sync_propagates_missing_keys() {
        let (manager, local, remote, _transport) = pair();

        assert!(local.write("k", entry_with_clock(json!("v"), 10, &[(1, 1)])));
        manager.sync_cycle().await;

        let synced = remote.read("k").unwrap();
        assert_eq!(synced.value, json!("v"));
        assert_eq!(synced.vector_clock.get(NodeId(1)), 1);
    }

    #[tokio::test]
    async fn test_sync_skips_unreachable_peer() {
        let (manager, local, remote, transport) = pair();

        local.write("k", entry_with_clock(json!("v"), 10, &[(1, 1)]));
        transport.partition(NodeId(2));

        // The cycle logs the failure and carries on; nothing arrives.
        manager.sync_cycle().await;
        assert!(remote.read("k").is_none());

        transport.heal(NodeId(2));
        manager.sync_cycle().await;
        assert!(remote.read("k").is_some());
    }

    #[tokio::test]
    async fn test_sync_with_empty_store_is_a_noop() {
        let (manager, _local, remote, _transport) = pair();
        manager.sync_cycle().await;
        assert!(remote.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_replicas_converge_both_ways() {
        let (manager, local, remote, _transport) = pair();

        // Each node accepted a different write for the same key while the
        // other was unaware: clocks are concurrent, timestamps differ.
        local.write("k", entry_with_clock(json!("from-1"), 10, &[(1, 1)]));
        remote.write("k", entry_with_clock(json!("from-2"), 20, &[(2, 1)]));

        // Push 1 -> 2: node 2 keeps its newer value but merges the clock.
        manager.sync_cycle().await;
        let at_remote = remote.read("k").unwrap();
        assert_eq!(at_remote.value, json!("from-2"));
        assert_eq!(at_remote.vector_clock.get(NodeId(1)), 1);
        assert_eq!(at_remote.vector_clock.get(NodeId(2)), 1);

        // Push 2 -> 1 (applied directly): node 1 adopts the winner.
        apply_entries(&local, remote.entries());
        let at_local = local.read("k").unwrap();
        assert_eq!(at_local.value, json!("from-2"));
        assert_eq!(at_local.timestamp, at_remote.timestamp);
        assert_eq!(at_local.vector_clock, at_remote.vector_clock);
    }

    #[tokio::test]
    async fn test_apply_entries_counts_changed_keys() {
        let (_manager, local, _remote, _transport) = pair();

        local.write("stale", entry_with_clock(json!("old"), 5, &[(1, 1)]));

        let batch = vec![
            ("fresh".to_string(), entry_with_clock(json!(1), 8, &[(2, 1)])),
            (
                "stale".to_string(),
                entry_with_clock(json!("new"), 9, &[(1, 1), (2, 1)]),
            ),
        ];

        // One new key plus one causally newer replacement.
        assert_eq!(apply_entries(&local, batch), 2);
        assert_eq!(local.read("stale").unwrap().value, json!("new"));

        // Re-applying the same batch changes nothing.
        let batch = vec![(
            "stale".to_string(),
            entry_with_clock(json!("new"), 9, &[(1, 1), (2, 1)]),
        )];
        assert_eq!(apply_entries(&local, batch), 0);
    }

    #[tokio::test]
    async fn test_apply_entries_ignored_when_down() {
        let (_manager, local, _remote, _transport) = pair();
        local.mark_down();

        let batch = vec![("k".to_string(), entry_with_clock(json!(1), 8, &[(2, 1)]))];
        assert_eq!(apply_entries(&local, batch), 0);

        local.mark_up();
        assert!(local.read("k").is_none());
    }
}
