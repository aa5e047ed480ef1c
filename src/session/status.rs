use super::session::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one session for read-only commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub tenant: String,

    /// Lifecycle state at snapshot time
    pub state: SessionState,

    /// The active item, when something is playing or paused
    pub now_playing: Option<NowPlaying>,

    /// Pending requests in play order
    pub queue: Vec<QueuedTrack>,

    pub queue_capacity: usize,

    /// Skip votes registered against the active item
    pub skip_votes: usize,

    pub skip_quorum: usize,
}

/// Summary of the item currently streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowPlaying {
    /// One-line presentation summary
    pub summary: String,

    pub requester: String,

    pub title: Option<String>,

    pub uploader: Option<String>,

    /// Full track length; elapsed playback time is not tracked
    pub duration_secs: Option<u64>,

    pub started_at: DateTime<Utc>,
}

/// One pending request in the queue listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTrack {
    /// 1-based queue position
    pub position: usize,

    pub requester: String,

    /// The raw query the user submitted
    pub query: String,

    /// Title, when the enqueue-time resolve succeeded
    pub title: Option<String>,

    pub duration_secs: Option<u64>,
}
