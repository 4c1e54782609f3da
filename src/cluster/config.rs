use std::net::SocketAddr;
use std::time::Duration;

use crate::cluster::types::{NodeId, Peer};
use crate::cluster::view::ClusterView;
use crate::error::KvError;

/// Everything a node needs to start serving. Assembled from CLI flags in
/// `main`, immutable afterwards.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Identity of this node.
    pub node_id: NodeId,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Remote cluster members.
    pub peers: Vec<Peer>,
    /// Replies required for a QUORUM-level read (R).
    pub read_quorum: usize,
    /// Acknowledgements required for a QUORUM-level write (W).
    pub write_quorum: usize,
    /// Per-call deadline for client-facing peer reads and writes.
    pub request_timeout: Duration,
    /// Deadline for liveness probes, much shorter than `request_timeout`.
    pub probe_timeout: Duration,
    /// How often the hinted-handoff loop probes unreachable targets.
    pub handoff_interval: Duration,
    /// Anti-entropy push interval. `None` disables the sync loop.
    pub sync_interval: Option<Duration>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId(1),
            bind_addr: "127.0.0.1:7001".parse().expect("static addr"),
            peers: Vec::new(),
            read_quorum: 1,
            write_quorum: 1,
            request_timeout: Duration::from_secs(3),
            probe_timeout: Duration::from_secs(1),
            handoff_interval: Duration::from_secs(5),
            sync_interval: None,
        }
    }
}

impl NodeConfig {
    /// Validate quorum arithmetic and build the immutable cluster view.
    /// Invalid configurations fail here, before the node serves anything.
    pub fn view(&self) -> Result<ClusterView, KvError> {
        ClusterView::new(
            self.node_id,
            self.peers.clone(),
            self.read_quorum,
            self.write_quorum,
        )
    }
}
