pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod playback;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{PlaybackError, Result};
pub use events::{ChannelPublisher, EventPublisher, NatsPublisher, PlayerEvent, SkipReason};
pub use http::{create_router, AppState};
pub use playback::{EtaOutcome, PlaybackQueue, PlaybackRequest, ResolvedTrack, SkipVotes};
pub use session::{
    EnqueueOutcome, SessionRegistry, SessionState, SessionStatus, SkipOutcome, StopOutcome,
    VoiceSession,
};
pub use transport::{OutputSink, SinkConnection, TrackResolver};
