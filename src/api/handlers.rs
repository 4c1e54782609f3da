use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::protocol::{
    ClientGetResponse, ClientPutRequest, ClientPutResponse, ErrorResponse, InternalReadResponse,
    InternalWriteRequest, InternalWriteResponse, InternalWriteStatus, SyncRequest, SyncResponse,
};
use crate::cluster::types::ConsistencyLevel;
use crate::cluster::view::ClusterView;
use crate::error::KvError;
use crate::quorum::coordinator::QuorumCoordinator;
use crate::storage::node::StorageNode;
use crate::sync::manager::apply_entries;
use crate::transport::PeerTransport;

#[derive(Debug, Deserialize)]
pub struct ConsistencyParams {
    pub consistency: Option<String>,
}

fn error_response(err: KvError) -> Response {
    let status = match err {
        KvError::QuorumUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        KvError::NotFound => StatusCode::NOT_FOUND,
        KvError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        KvError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// `GET /value/{key}?consistency=...` — quorum read.
pub async fn handle_client_get<T: PeerTransport>(
    Extension(coordinator): Extension<Arc<QuorumCoordinator<T>>>,
    Path(key): Path<String>,
    Query(params): Query<ConsistencyParams>,
) -> Response {
    let level =
        ConsistencyLevel::parse_or_quorum(params.consistency.as_deref().unwrap_or("QUORUM"));

    match coordinator.read(&key, level).await {
        Ok(read) => (
            StatusCode::OK,
            Json(ClientGetResponse {
                key,
                value: read.value,
                timestamp: read.timestamp,
                source_node: read.source_node,
                consistency_level: read.level.to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `PUT /value` — quorum write.
pub async fn handle_client_put<T: PeerTransport>(
    Extension(coordinator): Extension<Arc<QuorumCoordinator<T>>>,
    Json(req): Json<ClientPutRequest>,
) -> Response {
    if req.key.is_empty() {
        return error_response(KvError::MalformedRequest(
            "missing key in request".to_string(),
        ));
    }
    let value = match req.value {
        Some(v) if !v.is_null() => v,
        _ => {
            return error_response(KvError::MalformedRequest(
                "missing value in request".to_string(),
            ));
        }
    };

    let level =
        ConsistencyLevel::parse_or_quorum(req.consistency.as_deref().unwrap_or("QUORUM"));

    match coordinator.write(&req.key, value.clone(), level).await {
        Ok(write) => (
            StatusCode::OK,
            Json(ClientPutResponse {
                status: "success".to_string(),
                key: req.key,
                value,
                timestamp: write.timestamp,
                confirmed_nodes: write.confirmed_nodes,
                consistency_level: write.level.to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /internal/read/{key}` — this replica's local version of one key.
pub async fn handle_internal_read(
    Extension(store): Extension<Arc<StorageNode>>,
    Path(key): Path<String>,
) -> Response {
    if !store.is_up() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "node is down".to_string(),
            }),
        )
            .into_response();
    }

    match store.read(&key) {
        Some(entry) => (
            StatusCode::OK,
            Json(InternalReadResponse {
                key,
                value: entry.value,
                timestamp: entry.timestamp,
                vector_clock: entry.vector_clock,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "key not found".to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /internal/write` — apply a timestamped write to this replica.
pub async fn handle_internal_write(
    Extension(store): Extension<Arc<StorageNode>>,
    Json(req): Json<InternalWriteRequest>,
) -> Response {
    if !store.is_up() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "node is down".to_string(),
            }),
        )
            .into_response();
    }
    if req.key.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing key".to_string(),
            }),
        )
            .into_response();
    }

    let key = req.key.clone();
    let status = if store.write(&key, req.into()) {
        InternalWriteStatus::Success
    } else {
        // The stored version is at least as new; not an error, the sender
        // just learns its write was outdated here.
        InternalWriteStatus::Outdated
    };

    (StatusCode::OK, Json(InternalWriteResponse { status })).into_response()
}

/// `POST /internal/sync` — merge a peer's anti-entropy batch.
pub async fn handle_internal_sync(
    Extension(store): Extension<Arc<StorageNode>>,
    Json(req): Json<SyncRequest>,
) -> Response {
    if !store.is_up() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "node is down".to_string(),
            }),
        )
            .into_response();
    }

    let entries = req.entries.into_iter().map(|e| e.into_pair()).collect();
    let changed = apply_entries(&store, entries);
    if changed > 0 {
        tracing::debug!("Sync batch applied, {} key(s) changed", changed);
    }

    (
        StatusCode::OK,
        Json(SyncResponse {
            status: "sync_received".to_string(),
        }),
    )
        .into_response()
}

/// `GET /` — human-readable node summary; doubles as the liveness probe, so
/// it answers 503 while the local store is marked down.
pub async fn handle_home(
    Extension(store): Extension<Arc<StorageNode>>,
    Extension(view): Extension<ClusterView>,
) -> Response {
    if !store.is_up() {
        return (StatusCode::SERVICE_UNAVAILABLE, "node is down".to_string()).into_response();
    }

    let summary = format!(
        "Node {} serving {} key(s). N={} R={} W={}. Routes: /value/{{key}}, /value",
        view.local_id(),
        store.len(),
        view.n(),
        view.read_quorum(),
        view.write_quorum()
    );

    (StatusCode::OK, summary).into_response()
}
