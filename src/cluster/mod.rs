//! Cluster Membership Module
//!
//! Static description of the cluster and the quorum arithmetic derived from it.
//!
//! ## Core Concepts
//! - **ClusterView**: the fixed set of peers this node replicates to, supplied
//!   at startup and immutable afterwards. Every node holds the full key space;
//!   the cluster is replicated, not partitioned.
//! - **Consistency Levels**: ONE, QUORUM and ALL map to the number of replica
//!   acknowledgements an operation must collect before it succeeds.
//! - **Fail-fast validation**: quorum sizes outside `1..=N` abort startup; the
//!   classical `R + W > N` condition is advisory and only logs a warning.

pub mod config;
pub mod types;
pub mod view;
