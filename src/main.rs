use axum::{
    Router,
    extract::Extension,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quorumkv::api::handlers::{
    handle_client_get, handle_client_put, handle_home, handle_internal_read,
    handle_internal_sync, handle_internal_write,
};
use quorumkv::cluster::config::NodeConfig;
use quorumkv::cluster::types::{NodeId, Peer};
use quorumkv::handoff::manager::HintedHandoffManager;
use quorumkv::quorum::coordinator::QuorumCoordinator;
use quorumkv::storage::node::StorageNode;
use quorumkv::sync::manager::SyncManager;
use quorumkv::transport::HttpPeerTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --id <n> --bind <addr:port> [--peer <id>=<addr:port>]... \
             [--read-quorum <r>] [--write-quorum <w>] [--timeout-ms <ms>] \
             [--handoff-interval-secs <s>] [--sync-interval-secs <s>]",
            args[0]
        );
        eprintln!(
            "Example: {} --id 1 --bind 127.0.0.1:7001 --peer 2=127.0.0.1:7002 \
             --peer 3=127.0.0.1:7003 --read-quorum 2 --write-quorum 2",
            args[0]
        );
        std::process::exit(1);
    }

    let mut node_id: Option<NodeId> = None;
    let mut bind_addr: Option<SocketAddr> = None;
    let mut peers: Vec<Peer> = vec![];
    let mut config = NodeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => {
                node_id = Some(NodeId(args[i + 1].parse()?));
                i += 2;
            }
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--peer" => {
                let Some((id, addr)) = args[i + 1].split_once('=') else {
                    anyhow::bail!("--peer expects <id>=<addr:port>, got '{}'", args[i + 1]);
                };
                peers.push(Peer {
                    id: NodeId(id.parse()?),
                    addr: addr.parse()?,
                });
                i += 2;
            }
            "--read-quorum" => {
                config.read_quorum = args[i + 1].parse()?;
                i += 2;
            }
            "--write-quorum" => {
                config.write_quorum = args[i + 1].parse()?;
                i += 2;
            }
            "--timeout-ms" => {
                config.request_timeout = Duration::from_millis(args[i + 1].parse()?);
                i += 2;
            }
            "--handoff-interval-secs" => {
                config.handoff_interval = Duration::from_secs(args[i + 1].parse()?);
                i += 2;
            }
            "--sync-interval-secs" => {
                let secs: u64 = args[i + 1].parse()?;
                config.sync_interval = (secs > 0).then(|| Duration::from_secs(secs));
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    config.node_id = node_id.ok_or_else(|| anyhow::anyhow!("--id is required"))?;
    config.bind_addr = bind_addr.ok_or_else(|| anyhow::anyhow!("--bind is required"))?;
    config.peers = peers;

    // Fails fast on broken quorum arithmetic; the node never serves with an
    // invalid configuration.
    let view = config.view()?;

    tracing::info!(
        "Starting node {} on {} (N={}, R={}, W={})",
        config.node_id,
        config.bind_addr,
        view.n(),
        view.read_quorum(),
        view.write_quorum()
    );
    for peer in view.peers() {
        tracing::info!("  - peer {} at {}", peer.id, peer.addr);
    }

    let store = Arc::new(StorageNode::new(config.node_id));
    let transport = Arc::new(HttpPeerTransport::new(
        config.request_timeout,
        config.probe_timeout,
    ));
    let handoff = Arc::new(HintedHandoffManager::new(
        view.clone(),
        transport.clone(),
        config.handoff_interval,
    ));
    let coordinator = Arc::new(QuorumCoordinator::new(
        view.clone(),
        store.clone(),
        transport.clone(),
        handoff.clone(),
    ));

    // Background loops: hinted handoff always, anti-entropy when enabled.
    let handoff_loop = handoff.clone();
    tokio::spawn(async move {
        handoff_loop.run().await;
    });

    if let Some(interval) = config.sync_interval {
        let sync = Arc::new(SyncManager::new(
            view.clone(),
            store.clone(),
            transport.clone(),
            interval,
        ));
        tokio::spawn(async move {
            sync.run().await;
        });
    }

    let app = Router::new()
        .route("/", get(handle_home))
        .route("/value/{key}", get(handle_client_get::<HttpPeerTransport>))
        .route("/value", put(handle_client_put::<HttpPeerTransport>))
        .route("/internal/read/{key}", get(handle_internal_read))
        .route("/internal/write", post(handle_internal_write))
        .route("/internal/sync", post(handle_internal_sync))
        .layer(Extension(coordinator))
        .layer(Extension(store))
        .layer(Extension(view));

    tracing::info!("HTTP server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
