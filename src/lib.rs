//! Quorum-Replicated Key/Value Store Library
//!
//! This library crate defines the core modules of the replicated store.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of loosely coupled subsystems:
//!
//! - **`clock`**: vector clocks and the happens-before comparison used to
//!   tell causally ordered updates from concurrent ones.
//! - **`cluster`**: the static cluster view (node identity, peer endpoints)
//!   and the consistency-level-to-quorum-size arithmetic, validated at
//!   startup.
//! - **`storage`**: the per-node, in-memory last-writer-wins store with its
//!   availability flag.
//! - **`transport`**: the peer RPC abstraction (HTTP for real clusters,
//!   in-memory for tests) with timeout-bounded, failure-as-signal semantics.
//! - **`quorum`**: the coordinator fanning client GET/PUT out to all
//!   replicas, counting acknowledgements against the requested consistency
//!   level and triggering read repair.
//! - **`handoff`**: buffered redelivery of writes that missed an unreachable
//!   replica.
//! - **`sync`**: the periodic anti-entropy loop converging replicas by
//!   vector clock.
//! - **`api`**: the HTTP surface, client-facing and node-internal.

pub mod api;
pub mod clock;
pub mod cluster;
pub mod error;
pub mod handoff;
pub mod quorum;
pub mod storage;
pub mod sync;
pub mod transport;
