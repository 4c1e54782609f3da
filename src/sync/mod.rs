//! Anti-Entropy Sync Module
//!
//! Periodic peer-to-peer convergence for the causal-consistency variant:
//! each node pushes its full entry set to every peer, and the receiver
//! merges by vector clock instead of blindly trusting timestamps, so
//! concurrent updates are detected rather than silently overwritten.

pub mod manager;

#[cfg(test)]
mod tests;
