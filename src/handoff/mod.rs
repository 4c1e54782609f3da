//! Hinted Handoff Module
//!
//! Buffers writes that could not reach a peer and redelivers them once the
//! peer is back, so a successful quorum write eventually lands on every
//! replica without blocking client latency on the dead node.
//!
//! ## Core Mechanisms
//! - **Stash on failure**: the coordinator hands over one hint per
//!   unreachable peer after a quorum write succeeds.
//! - **Probe-then-drain**: a background loop probes targets with pending
//!   hints on a short timeout and, once a target answers, drains its whole
//!   queue atomically so a concurrent stash can never be delivered twice.
//! - **Timestamp gate downstream**: redelivered hints go through the normal
//!   write path, so a hint that lost the race against a newer write is simply
//!   rejected and dropped.

pub mod manager;

#[cfg(test)]
mod tests;
