use super::state::AppState;
use crate::error::PlaybackError;
use crate::playback::EtaOutcome;
use crate::session::{EnqueueOutcome, SkipOutcome, StopOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    /// Output target to connect the session to (e.g. a voice channel id)
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    /// Identity of the requesting user
    pub requester: String,

    /// Origin context for status events (e.g. the text channel to reply in)
    pub origin: String,

    /// Free-text query or URL to resolve
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub tenant: String,
    pub status: String,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SkipRequest {
    /// Identity of the voting user
    pub voter: String,
}

#[derive(Debug, Deserialize)]
pub struct ForceSkipRequest {
    /// Identity of the privileged user
    pub moderator: String,
}

#[derive(Debug, Serialize)]
pub struct SkipResponse {
    pub tenant: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quorum: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// Desired volume, clamped to 0.0..=2.0
    pub level: f32,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    pub tenant: String,
    /// Level actually applied after clamping
    pub level: f32,
}

#[derive(Debug, Serialize)]
pub struct EtaResponse {
    pub tenant: String,
    pub requester: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub tenant: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub tenants: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps scheduler errors onto HTTP status codes.
fn error_response(e: PlaybackError) -> axum::response::Response {
    let status = match e {
        PlaybackError::QueueFull => StatusCode::CONFLICT,
        PlaybackError::SessionClosed => StatusCode::CONFLICT,
        PlaybackError::NothingPlaying => StatusCode::NOT_FOUND,
        PlaybackError::Resolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlaybackError::Transport(_) => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/:tenant/join
/// Connect (or relocate) the session's output to a target
pub async fn join_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<JoinRequest>,
) -> impl IntoResponse {
    info!("Join request for tenant {} -> {}", tenant, req.target);

    match state.registry.join(&tenant, &req.target).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Join failed for tenant {}: {}", tenant, e);
            error_response(e)
        }
    }
}

/// POST /sessions/:tenant/queue
/// Enqueue a playback request
pub async fn enqueue_track(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<EnqueueRequest>,
) -> impl IntoResponse {
    match state
        .registry
        .enqueue(&tenant, &req.requester, &req.origin, &req.query)
        .await
    {
        Ok(EnqueueOutcome::Enqueued { summary, position }) => (
            StatusCode::OK,
            Json(EnqueueResponse {
                tenant,
                status: "enqueued".to_string(),
                position,
                summary: Some(summary),
            }),
        )
            .into_response(),
        Ok(EnqueueOutcome::Deferred { position }) => (
            StatusCode::OK,
            Json(EnqueueResponse {
                tenant,
                status: "deferred".to_string(),
                position,
                summary: None,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /sessions/:tenant/skip
/// Register a skip vote against the active item
pub async fn skip_track(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<SkipRequest>,
) -> impl IntoResponse {
    match state.registry.skip(&tenant, &req.voter).await {
        Ok(outcome) => {
            let response = match outcome {
                SkipOutcome::AlreadyVoted => SkipResponse {
                    tenant,
                    status: "already_voted".to_string(),
                    votes: None,
                    quorum: None,
                },
                SkipOutcome::VoteAdded { votes, quorum } => SkipResponse {
                    tenant,
                    status: "vote_added".to_string(),
                    votes: Some(votes),
                    quorum: Some(quorum),
                },
                SkipOutcome::Skipped => SkipResponse {
                    tenant,
                    status: "skipped".to_string(),
                    votes: None,
                    quorum: None,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /sessions/:tenant/skip/force
/// Skip the active item without voting (privileged)
pub async fn force_skip_track(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<ForceSkipRequest>,
) -> impl IntoResponse {
    match state.registry.force_skip(&tenant, &req.moderator).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SkipResponse {
                tenant,
                status: "skipped".to_string(),
                votes: None,
                quorum: None,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /sessions/:tenant/pause
pub async fn pause_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    match state.registry.pause(&tenant).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /sessions/:tenant/resume
pub async fn resume_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    match state.registry.resume(&tenant).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /sessions/:tenant/volume
pub async fn set_volume(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<VolumeRequest>,
) -> impl IntoResponse {
    match state.registry.set_volume(&tenant, req.level).await {
        Ok(level) => (StatusCode::OK, Json(VolumeResponse { tenant, level })).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /sessions/:tenant/eta/:requester
/// Time before the requester's first queued item starts
pub async fn get_eta(
    State(state): State<AppState>,
    Path((tenant, requester)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.registry.eta(&tenant, &requester).await {
        Ok(outcome) => {
            let (status, eta_secs) = match outcome {
                EtaOutcome::NextUp => ("next_up", None),
                EtaOutcome::NotInQueue => ("not_in_queue", None),
                EtaOutcome::Eta(eta) => ("eta", Some(eta.as_secs())),
            };
            (
                StatusCode::OK,
                Json(EtaResponse {
                    tenant,
                    requester,
                    status: status.to_string(),
                    eta_secs,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /sessions/:tenant/status
/// Snapshot of the session: state, active item, queue contents, votes
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    match state.registry.status(&tenant).await {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No session for tenant {}", tenant),
            }),
        )
            .into_response(),
    }
}

/// GET /sessions
/// List tenants with live sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let tenants = state.registry.tenants().await;
    (StatusCode::OK, Json(SessionListResponse { tenants })).into_response()
}

/// POST /sessions/:tenant/stop
/// Tear the session down: drain the queue and disconnect the output
pub async fn stop_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    info!("Stop request for tenant {}", tenant);

    match state.registry.stop(&tenant).await {
        StopOutcome::Stopped => (
            StatusCode::OK,
            Json(StopResponse {
                tenant: tenant.clone(),
                status: "stopped".to_string(),
                message: format!("Session stopped for tenant {}", tenant),
            }),
        )
            .into_response(),
        StopOutcome::AlreadyStopped => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No session for tenant {}", tenant),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
