//! Quorum Coordination Module
//!
//! Orchestrates client GET/PUT across the whole replica set.
//!
//! ## Core Concepts
//! - **Fan-out/fan-in**: every operation goes to the local store and all
//!   peers concurrently; each peer call is bounded by the transport timeout,
//!   so the aggregate never blocks past the slowest allowed call.
//! - **Quorum counting**: an operation succeeds once enough replicas answered
//!   for the requested consistency level; peer failures only shrink the
//!   count, they never abort the operation on their own.
//! - **Convergence hooks**: a quorum read fires read-repair writes at stale
//!   replicas in the background; a quorum write stashes hints for peers that
//!   were unreachable. Neither blocks the client response.
//! - **No rollback**: a failed quorum write leaves already-applied replicas
//!   as they are; the newer timestamp simply wins wherever it landed.

pub mod coordinator;
