use serde::{Deserialize, Serialize};

/// Why the active item was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The requester of the active item skipped their own track
    Requester,

    /// The vote quorum was reached
    Quorum,

    /// A privileged skip bypassed voting
    Moderator,
}

/// A user-visible scheduler event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A request was accepted into the queue
    Enqueued { summary: String, position: usize },

    /// The playback loop started streaming an item
    NowPlaying { summary: String },

    /// An item could not be resolved and was dropped; the loop moved on
    ResolutionFailed { query: String, reason: String },

    /// An item could not be played on the output connection and was dropped
    PlaybackFailed { summary: String, reason: String },

    /// A skip vote was counted, quorum not yet reached
    VoteAdded { votes: usize, quorum: usize },

    /// The active item was skipped
    Skipped { summary: String, reason: SkipReason },
}

/// Envelope published for each event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEventMessage {
    pub tenant: String,

    /// Origin context the event should be presented in
    pub origin: String,

    #[serde(flatten)]
    pub event: PlayerEvent,

    /// RFC3339 timestamp
    pub timestamp: String,
}
