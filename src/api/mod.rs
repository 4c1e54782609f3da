//! HTTP API Module
//!
//! The cluster boundary: client-facing quorum GET/PUT plus the internal
//! replica routes peers call during fan-out, read repair, hint redelivery
//! and anti-entropy sync. `GET /` doubles as the liveness probe.

pub mod handlers;
pub mod protocol;
