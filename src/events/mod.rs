//! User-visible scheduler events
//!
//! The playback loop and the skip path emit `PlayerEvent`s addressed to a
//! request's origin context. The presentation layer (bot frontend, web UI)
//! subscribes and turns them into user-facing text. Implementations:
//! - `NatsPublisher` - publishes JSON envelopes to `playback.events.<tenant>`
//! - `ChannelPublisher` - in-process channel, used by tests and embedders

mod channel;
mod messages;
mod nats;

pub use channel::ChannelPublisher;
pub use messages::{PlayerEvent, PlayerEventMessage, SkipReason};
pub use nats::NatsPublisher;

use anyhow::Result;

/// Outbound channel for user-visible scheduler events.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event` for `tenant`, addressed to `origin`.
    ///
    /// Failures are the caller's to log; event delivery is best-effort and
    /// never affects scheduling decisions.
    async fn publish(&self, tenant: &str, origin: &str, event: PlayerEvent) -> Result<()>;
}
