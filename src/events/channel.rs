use super::messages::{PlayerEvent, PlayerEventMessage};
use super::EventPublisher;
use anyhow::Result;
use tokio::sync::mpsc;

/// In-process event publisher backed by an unbounded channel.
///
/// Used by tests and by embedders that present events without a broker.
/// Delivery is best-effort: once the receiver is dropped, publishes become
/// no-ops rather than errors.
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PlayerEventMessage>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayerEventMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, tenant: &str, origin: &str, event: PlayerEvent) -> Result<()> {
        let message = PlayerEventMessage {
            tenant: tenant.to_string(),
            origin: origin.to_string(),
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let _ = self.tx.send(message);
        Ok(())
    }
}
