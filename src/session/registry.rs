use super::session::{
    EnqueueOutcome, SessionState, SkipOutcome, StopOutcome, VoiceSession,
};
use super::status::SessionStatus;
use crate::config::SchedulerConfig;
use crate::error::{PlaybackError, Result};
use crate::events::EventPublisher;
use crate::playback::EtaOutcome;
use crate::transport::{OutputSink, TrackResolver};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Owns every live session, keyed by tenant.
///
/// Commands address tenants, not sessions: the registry resolves the tenant
/// to a session, creating one where the command implies it (enqueue, join)
/// and failing where it does not (skip, pause, eta).
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<VoiceSession>>>,
    scheduler: SchedulerConfig,
    resolver: Arc<dyn TrackResolver>,
    sink: Arc<dyn OutputSink>,
    events: Arc<dyn EventPublisher>,
}

impl SessionRegistry {
    pub fn new(
        scheduler: SchedulerConfig,
        resolver: Arc<dyn TrackResolver>,
        sink: Arc<dyn OutputSink>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            scheduler,
            resolver,
            sink,
            events,
        }
    }

    /// Returns the tenant's session, creating and spawning one if absent.
    ///
    /// The whole check-then-insert runs under the write lock, so two
    /// concurrent commands for a new tenant get the same session. A session
    /// caught mid-teardown is replaced rather than returned.
    pub async fn get_or_create(&self, tenant: &str) -> Arc<VoiceSession> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get(tenant) {
            let state = session.state().await;
            if !matches!(state, SessionState::Stopping | SessionState::Closed) {
                return Arc::clone(session);
            }
            debug!(tenant = %tenant, "Replacing stopped session");
        }

        let session = VoiceSession::spawn(
            tenant,
            &self.scheduler,
            Arc::clone(&self.resolver),
            Arc::clone(&self.sink),
            Arc::clone(&self.events),
        )
        .await;

        sessions.insert(tenant.to_string(), Arc::clone(&session));
        session
    }

    pub async fn get(&self, tenant: &str) -> Option<Arc<VoiceSession>> {
        self.sessions.read().await.get(tenant).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn tenants(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Connects (or relocates) the tenant's output to `target`.
    pub async fn join(&self, tenant: &str, target: &str) -> Result<()> {
        self.get_or_create(tenant).await.join(target).await
    }

    /// Accepts a playback request for the tenant, creating the session on
    /// first use.
    pub async fn enqueue(
        &self,
        tenant: &str,
        requester: &str,
        origin: &str,
        query: &str,
    ) -> Result<EnqueueOutcome> {
        self.get_or_create(tenant)
            .await
            .enqueue(requester, origin, query)
            .await
    }

    pub async fn skip(&self, tenant: &str, voter: &str) -> Result<SkipOutcome> {
        self.require(tenant).await?.skip(voter).await
    }

    pub async fn force_skip(&self, tenant: &str, moderator: &str) -> Result<()> {
        self.require(tenant).await?.force_skip(moderator).await
    }

    pub async fn pause(&self, tenant: &str) -> Result<()> {
        self.require(tenant).await?.pause().await
    }

    pub async fn resume(&self, tenant: &str) -> Result<()> {
        self.require(tenant).await?.resume().await
    }

    pub async fn set_volume(&self, tenant: &str, level: f32) -> Result<f32> {
        self.require(tenant).await?.set_volume(level).await
    }

    pub async fn eta(&self, tenant: &str, requester: &str) -> Result<EtaOutcome> {
        self.require(tenant).await?.eta(requester).await
    }

    pub async fn status(&self, tenant: &str) -> Option<SessionStatus> {
        match self.get(tenant).await {
            Some(session) => Some(session.status().await),
            None => None,
        }
    }

    /// Detaches the tenant's session without stopping its loop.
    ///
    /// Callers are expected to stop the session first; `stop` and
    /// `teardown_all` do both.
    pub async fn remove(&self, tenant: &str) -> Option<Arc<VoiceSession>> {
        self.sessions.write().await.remove(tenant)
    }

    /// Stops the tenant's session and removes it from the map.
    ///
    /// The entry is only cleared after the loop has shut down, and only if
    /// it still points at the session that was stopped; a replacement
    /// created in the meantime is left alone.
    pub async fn stop(&self, tenant: &str) -> StopOutcome {
        let Some(session) = self.get(tenant).await else {
            return StopOutcome::AlreadyStopped;
        };

        let outcome = session.stop().await;

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(tenant)
            .is_some_and(|current| Arc::ptr_eq(current, &session))
        {
            sessions.remove(tenant);
        }

        outcome
    }

    /// Stops every session. Called on daemon shutdown.
    pub async fn teardown_all(&self) {
        let sessions: Vec<(String, Arc<VoiceSession>)> =
            self.sessions.write().await.drain().collect();

        if sessions.is_empty() {
            return;
        }

        info!("Tearing down {} active session(s)", sessions.len());

        for (tenant, session) in sessions {
            session.stop().await;
            info!(tenant = %tenant, "Session torn down");
        }
    }

    /// Commands that act on an existing session; a missing tenant means
    /// nothing is playing for it.
    async fn require(&self, tenant: &str) -> Result<Arc<VoiceSession>> {
        self.get(tenant).await.ok_or(PlaybackError::NothingPlaying)
    }
}
