use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Metadata for a track the resolver has successfully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTrack {
    /// Playable stream location, opaque to the scheduler
    pub stream_url: String,

    /// Track title
    pub title: String,

    /// Uploader / artist name
    pub uploader: String,

    /// Track length, when the resolver could determine it
    pub duration: Option<Duration>,
}

impl ResolvedTrack {
    /// Track length, treating an unknown duration as zero.
    ///
    /// ETA math only counts resolved durations, so "unknown" and "instant"
    /// are deliberately the same thing here.
    pub fn duration_or_zero(&self) -> Duration {
        self.duration.unwrap_or(Duration::ZERO)
    }
}

/// A single playback request scoped to one session.
///
/// Created when a user issues a play command and immutable once queued. The
/// track metadata may be missing if the enqueue-time resolve failed; the
/// playback loop re-resolves before playing either way, since stream URLs
/// can expire while a request sits in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackRequest {
    /// Unique request id
    pub id: Uuid,

    /// Identity of the user who requested the track
    pub requester: String,

    /// Origin context (e.g. the channel that status updates post back to)
    pub origin: String,

    /// The raw query or URL the user submitted
    pub query: String,

    /// Resolved metadata, when the enqueue-time resolve succeeded
    pub track: Option<ResolvedTrack>,

    /// When the request was accepted
    pub requested_at: DateTime<Utc>,
}

impl PlaybackRequest {
    pub fn new(requester: &str, origin: &str, query: &str, track: Option<ResolvedTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester: requester.to_string(),
            origin: origin.to_string(),
            query: query.to_string(),
            track,
            requested_at: Utc::now(),
        }
    }

    /// Duration this request contributes to ETA sums (zero when unresolved).
    pub fn duration_or_zero(&self) -> Duration {
        self.track
            .as_ref()
            .map(ResolvedTrack::duration_or_zero)
            .unwrap_or(Duration::ZERO)
    }

    /// Human-readable one-line summary, e.g.
    /// `*Title* uploaded by Uploader and requested by user [length: 3m 25s]`
    pub fn summary(&self) -> String {
        match &self.track {
            Some(track) => {
                let mut fmt = format!(
                    "*{}* uploaded by {} and requested by {}",
                    track.title, track.uploader, self.requester
                );
                if let Some(duration) = track.duration {
                    let secs = duration.as_secs();
                    fmt.push_str(&format!(" [length: {}m {}s]", secs / 60, secs % 60));
                }
                fmt
            }
            None => format!("`{}` requested by {}", self.query, self.requester),
        }
    }
}
