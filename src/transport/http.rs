use async_trait::async_trait;
use std::time::Duration;

use crate::api::protocol::{
    ENDPOINT_INTERNAL_READ, ENDPOINT_INTERNAL_SYNC, ENDPOINT_INTERNAL_WRITE, InternalReadResponse,
    InternalWriteRequest, InternalWriteResponse, InternalWriteStatus, SyncEntry, SyncRequest,
};
use crate::cluster::types::Peer;
use crate::storage::node::StoredEntry;
use crate::transport::{PeerTransport, ReadReply, WriteAck};

/// JSON-over-HTTP transport against the peers' `/internal/*` routes.
///
/// Client-facing reads and writes run under `request_timeout` (3s by
/// default); liveness probes use the much shorter `probe_timeout` so the
/// handoff loop notices a dead peer quickly.
pub struct HttpPeerTransport {
    client: reqwest::Client,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpPeerTransport {
    pub fn new(request_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout,
            probe_timeout,
        }
    }
}

#[async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn remote_read(&self, peer: &Peer, key: &str) -> ReadReply {
        let url = format!("http://{}{}/{}", peer.addr, ENDPOINT_INTERNAL_READ, key);

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("Read from node {} failed: {}", peer.id, e);
                return ReadReply::Unreachable;
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return ReadReply::NotFound;
        }
        if !response.status().is_success() {
            return ReadReply::Unreachable;
        }

        match response.json::<InternalReadResponse>().await {
            Ok(body) => ReadReply::Found(StoredEntry {
                value: body.value,
                timestamp: body.timestamp,
                vector_clock: body.vector_clock,
            }),
            Err(e) => {
                tracing::warn!("Unparseable read reply from node {}: {}", peer.id, e);
                ReadReply::Unreachable
            }
        }
    }

    async fn remote_write(&self, peer: &Peer, key: &str, entry: &StoredEntry) -> WriteAck {
        let url = format!("http://{}{}", peer.addr, ENDPOINT_INTERNAL_WRITE);
        let payload = InternalWriteRequest {
            key: key.to_string(),
            value: entry.value.clone(),
            timestamp: entry.timestamp,
            vector_clock: entry.vector_clock.clone(),
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await;

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!("Write to node {} answered {}", peer.id, resp.status());
                return WriteAck::Unreachable;
            }
            Err(e) => {
                tracing::debug!("Write to node {} failed: {}", peer.id, e);
                return WriteAck::Unreachable;
            }
        };

        match response.json::<InternalWriteResponse>().await {
            Ok(body) => match body.status {
                InternalWriteStatus::Success => WriteAck::Accepted,
                InternalWriteStatus::Outdated => WriteAck::Rejected,
            },
            Err(e) => {
                tracing::warn!("Unparseable write reply from node {}: {}", peer.id, e);
                WriteAck::Unreachable
            }
        }
    }

    async fn probe(&self, peer: &Peer) -> bool {
        let url = format!("http://{}/", peer.addr);

        match self.client.get(url).timeout(self.probe_timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn push_sync(&self, peer: &Peer, entries: &[(String, StoredEntry)]) -> bool {
        let url = format!("http://{}{}", peer.addr, ENDPOINT_INTERNAL_SYNC);
        let payload = SyncRequest {
            entries: entries
                .iter()
                .map(|(key, entry)| SyncEntry::from_pair(key.clone(), entry.clone()))
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await;

        match response {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Sync push to node {} failed: {}", peer.id, e);
                false
            }
        }
    }
}
