//! Hinted Handoff Tests
//!
//! Validates stash/probe/redeliver behavior against the in-memory transport,
//! including the full five-node kill-and-recover scenario.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::clock::vector::VectorClock;
    use crate::cluster::types::{ConsistencyLevel, NodeId, Peer};
    use crate::cluster::view::ClusterView;
    use crate::handoff::manager::HintedHandoffManager;
    use crate::quorum::coordinator::QuorumCoordinator;
    use crate::storage::node::{StorageNode, StoredEntry};
    use crate::transport::InMemoryTransport;

    struct Cluster {
        coordinator: Arc<QuorumCoordinator<InMemoryTransport>>,
        nodes: Vec<Arc<StorageNode>>,
        transport: Arc<InMemoryTransport>,
        handoff: Arc<HintedHandoffManager<InMemoryTransport>>,
    }

    fn cluster(n: u64, read_quorum: usize, write_quorum: usize) -> Cluster {
        let peers: Vec<Peer> = (2..=n)
            .map(|id| Peer {
                id: NodeId(id),
                addr: format!("127.0.0.1:{}", 7000 + id).parse().unwrap(),
            })
            .collect();
        let view = ClusterView::new(NodeId(1), peers, read_quorum, write_quorum).unwrap();

        let transport = Arc::new(InMemoryTransport::new());
        let nodes: Vec<Arc<StorageNode>> = (1..=n)
            .map(|id| Arc::new(StorageNode::new(NodeId(id))))
            .collect();
        for node in &nodes {
            transport.register(node.clone());
        }

        let handoff = Arc::new(HintedHandoffManager::new(
            view.clone(),
            transport.clone(),
            Duration::from_millis(50),
        ));
        let coordinator = Arc::new(QuorumCoordinator::new(
            view,
            nodes[0].clone(),
            transport.clone(),
            handoff.clone(),
        ));

        Cluster {
            coordinator,
            nodes,
            transport,
            handoff,
        }
    }

    fn entry(value: serde_json::Value, timestamp: u64) -> StoredEntry {
        StoredEntry {
            value,
            timestamp,
            vector_clock: VectorClock::new(),
        }
    }

    #[tokio::test]
    async fn test_hints_wait_while_target_is_down() {
        let cluster = cluster(2, 1, 1);
        cluster.transport.partition(NodeId(2));

        cluster.handoff.stash(NodeId(2), "k", &entry(json!("v"), 10));
        cluster.handoff.deliver_cycle().await;

        // Probe still fails, the hint must survive for the next cycle.
        assert_eq!(cluster.handoff.pending(NodeId(2)), 1);
        assert!(cluster.nodes[1].read("k").is_none());
    }

    #[tokio::test]
    async fn test_hints_delivered_after_recovery() {
        let cluster = cluster(2, 1, 1);
        cluster.transport.partition(NodeId(2));

        cluster.handoff.stash(NodeId(2), "k", &entry(json!("v"), 10));
        cluster.handoff.stash(NodeId(2), "other", &entry(json!(7), 11));

        cluster.transport.heal(NodeId(2));
        cluster.handoff.deliver_cycle().await;

        assert_eq!(cluster.handoff.pending(NodeId(2)), 0);

        let delivered = cluster.nodes[1].read("k").unwrap();
        assert_eq!(delivered.value, json!("v"));
        assert_eq!(delivered.timestamp, 10);
        assert_eq!(cluster.nodes[1].read("other").unwrap().value, json!(7));
    }

    #[tokio::test]
    async fn test_obsolete_hint_is_discarded() {
        let cluster = cluster(2, 1, 1);

        // The target already advanced past the buffered write.
        assert!(cluster.nodes[1].write("k", entry(json!("newer"), 50)));
        cluster.handoff.stash(NodeId(2), "k", &entry(json!("old"), 10));

        cluster.handoff.deliver_cycle().await;

        assert_eq!(cluster.handoff.pending(NodeId(2)), 0);
        let stored = cluster.nodes[1].read("k").unwrap();
        assert_eq!(stored.value, json!("newer"));
        assert_eq!(stored.timestamp, 50);
    }

    #[tokio::test]
    async fn test_stash_during_drain_is_kept_for_next_cycle() {
        let cluster = cluster(2, 1, 1);
        cluster.transport.partition(NodeId(2));

        cluster.handoff.stash(NodeId(2), "a", &entry(json!(1), 10));
        cluster.handoff.deliver_cycle().await;

        // A second stash while the target is still away accumulates.
        cluster.handoff.stash(NodeId(2), "b", &entry(json!(2), 11));
        assert_eq!(cluster.handoff.pending(NodeId(2)), 2);

        cluster.transport.heal(NodeId(2));
        cluster.handoff.deliver_cycle().await;

        assert_eq!(cluster.handoff.pending(NodeId(2)), 0);
        assert!(cluster.nodes[1].read("a").is_some());
        assert!(cluster.nodes[1].read("b").is_some());
    }

    #[tokio::test]
    async fn test_kill_two_nodes_write_recover_converge() {
        // N=5, R=3, W=3.
        let cluster = cluster(5, 3, 3);

        // Healthy cluster: all five confirm.
        let first = cluster
            .coordinator
            .write("contador", json!(0), ConsistencyLevel::Quorum)
            .await
            .unwrap();
        assert_eq!(first.confirmed_nodes, 5);

        // Two nodes die.
        cluster.transport.partition(NodeId(4));
        cluster.transport.partition(NodeId(5));

        // Three survivors still make W=3.
        let second = cluster
            .coordinator
            .write("contador", json!(1), ConsistencyLevel::Quorum)
            .await
            .unwrap();
        assert_eq!(second.confirmed_nodes, 3);

        // The surviving quorum reads the new value.
        let read = cluster
            .coordinator
            .read("contador", ConsistencyLevel::Quorum)
            .await
            .unwrap();
        assert_eq!(read.value, json!(1));

        // The dead nodes still hold the old value.
        assert_eq!(cluster.nodes[3].read("contador").unwrap().value, json!(0));
        assert_eq!(cluster.nodes[4].read("contador").unwrap().value, json!(0));

        // They come back, one handoff cycle runs, and a direct read on a
        // previously dead node (bypassing the quorum) sees the new value.
        cluster.transport.heal(NodeId(4));
        cluster.transport.heal(NodeId(5));
        cluster.handoff.deliver_cycle().await;

        for recovered in [&cluster.nodes[3], &cluster.nodes[4]] {
            let stored = recovered.read("contador").unwrap();
            assert_eq!(stored.value, json!(1));
            assert_eq!(stored.timestamp, second.timestamp);
        }
        assert_eq!(cluster.handoff.pending(NodeId(4)), 0);
        assert_eq!(cluster.handoff.pending(NodeId(5)), 0);
    }
}
