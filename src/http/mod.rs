//! HTTP API server for external control (bot frontends, web UI)
//!
//! This module provides a REST API for driving playback sessions:
//! - POST /sessions/:tenant/join - Connect or relocate the output
//! - POST /sessions/:tenant/queue - Enqueue a playback request
//! - POST /sessions/:tenant/skip - Register a skip vote
//! - POST /sessions/:tenant/skip/force - Privileged skip
//! - POST /sessions/:tenant/pause, /resume, /volume, /stop
//! - GET /sessions/:tenant/status, /eta/:requester - Session queries
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
