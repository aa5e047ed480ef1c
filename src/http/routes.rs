use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/:tenant/join", post(handlers::join_session))
        .route("/sessions/:tenant/queue", post(handlers::enqueue_track))
        .route("/sessions/:tenant/skip", post(handlers::skip_track))
        .route(
            "/sessions/:tenant/skip/force",
            post(handlers::force_skip_track),
        )
        .route("/sessions/:tenant/pause", post(handlers::pause_session))
        .route("/sessions/:tenant/resume", post(handlers::resume_session))
        .route("/sessions/:tenant/volume", post(handlers::set_volume))
        .route("/sessions/:tenant/stop", post(handlers::stop_session))
        // Session queries
        .route("/sessions/:tenant/eta/:requester", get(handlers::get_eta))
        .route(
            "/sessions/:tenant/status",
            get(handlers::get_session_status),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
