//! Replica Storage Module
//!
//! Implements the in-memory, last-writer-wins store held by every node.
//!
//! ## Core Concepts
//! - **Full replication**: each node holds the whole key space; there is no
//!   partitioning step between key and replica set.
//! - **Timestamp gate**: a write lands only if strictly newer than the stored
//!   version, which makes replayed or reordered writes harmless.
//! - **Availability flag**: `mark_down`/`mark_up` model a crashed node without
//!   touching its data, so recovery behaves like a restart with state intact.

pub mod node;
