use crate::cluster::types::{ConsistencyLevel, NodeId, Operation, Peer};
use crate::error::KvError;

/// Immutable view of the cluster from one node: who we are, who the peers
/// are, and the configured quorum sizes.
///
/// N is fixed at construction as `1 + peers.len()`. Construction fails fast
/// on any quorum size outside `1..=N`; `R + W <= N` is allowed but logged as
/// a warning because it forfeits the read-your-writes guarantee.
#[derive(Debug, Clone)]
pub struct ClusterView {
    local_id: NodeId,
    peers: Vec<Peer>,
    read_quorum: usize,
    write_quorum: usize,
}

impl ClusterView {
    pub fn new(
        local_id: NodeId,
        peers: Vec<Peer>,
        read_quorum: usize,
        write_quorum: usize,
    ) -> Result<Self, KvError> {
        let n = 1 + peers.len();

        if read_quorum == 0 || write_quorum == 0 {
            return Err(KvError::InvalidConfig(
                "read and write quorums must be at least 1".to_string(),
            ));
        }
        if read_quorum > n || write_quorum > n {
            return Err(KvError::InvalidConfig(format!(
                "read quorum ({}) or write quorum ({}) exceeds cluster size ({})",
                read_quorum, write_quorum, n
            )));
        }
        for peer in &peers {
            if peer.id == local_id {
                return Err(KvError::InvalidConfig(format!(
                    "peer list contains the local node id {}",
                    local_id
                )));
            }
            if peers.iter().filter(|p| p.id == peer.id).count() > 1 {
                return Err(KvError::InvalidConfig(format!(
                    "duplicate peer id {}",
                    peer.id
                )));
            }
        }

        if read_quorum + write_quorum <= n {
            tracing::warn!(
                "Quorums R={} W={} do not guarantee strong consistency (R + W <= N={})",
                read_quorum,
                write_quorum,
                n
            );
        }

        Ok(Self {
            local_id,
            peers,
            read_quorum,
            write_quorum,
        })
    }

    pub fn local_id(&self) -> NodeId {
        self.local_id
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn peer(&self, id: NodeId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Total node count, local node included.
    pub fn n(&self) -> usize {
        1 + self.peers.len()
    }

    pub fn read_quorum(&self) -> usize {
        self.read_quorum
    }

    pub fn write_quorum(&self) -> usize {
        self.write_quorum
    }

    /// Replies required for `op` at `level`: ONE needs a single reply, ALL
    /// needs every node, QUORUM the configured R or W.
    pub fn required_quorum(&self, level: ConsistencyLevel, op: Operation) -> usize {
        match level {
            ConsistencyLevel::One => 1,
            ConsistencyLevel::All => self.n(),
            ConsistencyLevel::Quorum => match op {
                Operation::Read => self.read_quorum,
                Operation::Write => self.write_quorum,
            },
        }
    }
}
