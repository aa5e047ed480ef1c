use super::messages::{PlayerEvent, PlayerEventMessage};
use super::EventPublisher;
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{debug, info};

/// Publishes player events to NATS, one subject per tenant.
pub struct NatsPublisher {
    client: Client,
}

impl NatsPublisher {
    /// Connect to the NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, tenant: &str, origin: &str, event: PlayerEvent) -> Result<()> {
        let subject = format!("playback.events.{}", tenant);

        let message = PlayerEventMessage {
            tenant: tenant.to_string(),
            origin: origin.to_string(),
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish player event")?;

        debug!("Published player event to {}", subject);

        Ok(())
    }
}
