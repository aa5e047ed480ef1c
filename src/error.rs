use thiserror::Error;

/// Errors surfaced by scheduler operations.
///
/// Everything here is user-correctable or expected: none of these variants
/// should take a session loop down.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The playback queue is at capacity; the request was not added
    #[error("the playback queue is full")]
    QueueFull,

    /// The operation arrived after the session was stopped or unloaded
    #[error("the session is closed")]
    SessionClosed,

    /// The operation requires an active item, but nothing is playing
    #[error("nothing is playing right now")]
    NothingPlaying,

    /// Track resolution failed (bad query, unsupported URL, network error)
    #[error("failed to resolve track: {0}")]
    Resolution(String),

    /// The output transport refused a connection or relocation
    #[error("output transport failure: {0}")]
    Transport(String),
}

/// Convenience Result type for scheduler operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
