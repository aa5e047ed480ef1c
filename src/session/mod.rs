//! Per-tenant voice sessions and the registry that owns them
//!
//! A `VoiceSession` bundles one tenant's output connection, pending-request
//! queue, skip votes, and background playback loop. The `SessionRegistry`
//! maps tenants to sessions, creating them on demand and tearing them all
//! down at shutdown.

mod registry;
mod session;
mod status;

pub use registry::SessionRegistry;
pub use session::{
    EnqueueOutcome, SessionState, SkipOutcome, StopOutcome, VoiceSession,
};
pub use status::{NowPlaying, QueuedTrack, SessionStatus};
