use super::status::{NowPlaying, QueuedTrack, SessionStatus};
use crate::config::SchedulerConfig;
use crate::error::{PlaybackError, Result};
use crate::events::{EventPublisher, PlayerEvent, SkipReason};
use crate::playback::{EtaOutcome, PlaybackQueue, PlaybackRequest, SkipVotes, VoteOutcome};
use crate::transport::{OutputSink, SinkConnection, TrackResolver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connected (or connectable), nothing playing, loop waiting on the queue
    Idle,

    /// An item is streaming on the output connection
    Playing,

    /// The active item is held; resume returns to Playing
    Paused,

    /// Stop has begun; commands are rejected while teardown runs
    Stopping,

    /// Teardown finished; the session is inert and should be dropped
    Closed,
}

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Accepted with resolved metadata
    Enqueued { summary: String, position: usize },

    /// Accepted, but resolution was deferred to playback time
    Deferred { position: usize },
}

/// Outcome of a skip vote or privileged skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The voter already voted against this item
    AlreadyVoted,

    /// Vote counted, quorum not yet reached
    VoteAdded { votes: usize, quorum: usize },

    /// The active item was skipped
    Skipped,
}

/// Outcome of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// This call performed the teardown
    Stopped,

    /// The session was already stopping or closed
    AlreadyStopped,
}

/// The item the playback loop is currently streaming.
struct ActiveItem {
    request: PlaybackRequest,

    /// Fired exactly once to advance past this item. Both the natural
    /// completion callback and the skip path funnel into this one signal,
    /// so a skip racing a completion cannot double-advance the loop.
    advance: Arc<Notify>,

    started_at: DateTime<Utc>,
}

/// Mutable session state, guarded by one mutex.
///
/// Lock ordering: never hold this lock while locking the queue, and never
/// await the loop handle while holding it.
struct SessionInner {
    state: SessionState,
    connection: Option<Box<dyn SinkConnection>>,
    active: Option<ActiveItem>,
    votes: SkipVotes,
    volume: f32,
    loop_handle: Option<JoinHandle<()>>,
}

/// One tenant's playback session: an output connection, a bounded queue of
/// pending requests, and a background loop that streams them in order.
///
/// All commands go through `&self` methods; the loop is the only consumer of
/// the queue and the only writer of the Playing/Idle transition.
pub struct VoiceSession {
    tenant: String,
    queue: PlaybackQueue,
    inner: Mutex<SessionInner>,
    cancel: CancellationToken,
    resolver: Arc<dyn TrackResolver>,
    sink: Arc<dyn OutputSink>,
    events: Arc<dyn EventPublisher>,
    skip_quorum: usize,
}

impl VoiceSession {
    /// Creates the session and spawns its playback loop.
    pub async fn spawn(
        tenant: &str,
        scheduler: &SchedulerConfig,
        resolver: Arc<dyn TrackResolver>,
        sink: Arc<dyn OutputSink>,
        events: Arc<dyn EventPublisher>,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            tenant: tenant.to_string(),
            queue: PlaybackQueue::new(scheduler.queue_capacity),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                connection: None,
                active: None,
                votes: SkipVotes::new(scheduler.skip_quorum),
                volume: scheduler.default_volume,
                loop_handle: None,
            }),
            cancel: CancellationToken::new(),
            resolver,
            sink,
            events,
            skip_quorum: scheduler.skip_quorum,
        });

        let handle = tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                session.playback_loop().await;
            }
        });

        session.inner.lock().await.loop_handle = Some(handle);

        info!(tenant = %session.tenant, "Playback session started");

        session
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Connects the session's output to `target`, relocating if already
    /// connected elsewhere.
    ///
    /// Relocation advances past the active item: the old connection is
    /// streaming it and the new one is not.
    pub async fn join(&self, target: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        if let Some(mut old) = inner.connection.take() {
            if old.target() == target {
                inner.connection = Some(old);
                return Ok(());
            }

            info!(
                tenant = %self.tenant,
                from = %old.target(),
                to = %target,
                "Relocating output connection"
            );

            Self::advance_active(&mut inner);

            if let Err(e) = old.stop().await {
                warn!(tenant = %self.tenant, "Failed to stop old connection: {}", e);
            }
            if let Err(e) = old.disconnect().await {
                warn!(tenant = %self.tenant, "Failed to disconnect old connection: {}", e);
            }
        }

        let connection = self
            .sink
            .connect(&self.tenant, target)
            .await
            .map_err(|e| PlaybackError::Transport(e.to_string()))?;

        info!(tenant = %self.tenant, target = %target, "Output connected");

        inner.connection = Some(connection);
        Ok(())
    }

    /// Accepts a playback request, resolving metadata eagerly when possible.
    ///
    /// A failed resolve does not reject the request: stream URLs are
    /// re-resolved by the loop at playback time anyway, so the request is
    /// queued unresolved and only dropped if that second resolve also fails.
    pub async fn enqueue(&self, requester: &str, origin: &str, query: &str) -> Result<EnqueueOutcome> {
        self.ensure_open(&*self.inner.lock().await)?;

        // Fail fast before spending a resolve on a request that cannot fit.
        // The authoritative capacity check is inside try_enqueue.
        if self.queue.is_full().await {
            return Err(PlaybackError::QueueFull);
        }

        let track = match self.resolver.resolve(query).await {
            Ok(track) => Some(track),
            Err(e) => {
                debug!(
                    tenant = %self.tenant,
                    query = %query,
                    "Enqueue-time resolve failed, deferring: {}",
                    e
                );
                None
            }
        };

        self.ensure_open(&*self.inner.lock().await)?;

        let resolved = track.is_some();
        let request = PlaybackRequest::new(requester, origin, query, track);
        let summary = request.summary();

        let position = self.queue.try_enqueue(request).await?;

        info!(
            tenant = %self.tenant,
            requester = %requester,
            position = position,
            resolved = resolved,
            "Request enqueued"
        );

        if resolved {
            self.emit(
                origin,
                PlayerEvent::Enqueued {
                    summary: summary.clone(),
                    position,
                },
            )
            .await;

            Ok(EnqueueOutcome::Enqueued { summary, position })
        } else {
            Ok(EnqueueOutcome::Deferred { position })
        }
    }

    /// Registers a skip vote from `voter` against the active item.
    pub async fn skip(&self, voter: &str) -> Result<SkipOutcome> {
        let (outcome, origin, summary) = {
            let mut inner = self.inner.lock().await;
            self.ensure_open(&inner)?;

            let active = inner.active.as_ref().ok_or(PlaybackError::NothingPlaying)?;
            let requester = active.request.requester.clone();
            let origin = active.request.origin.clone();
            let summary = active.request.summary();

            let outcome = inner.votes.register(voter, &requester);
            if matches!(
                outcome,
                VoteOutcome::RequesterOverride | VoteOutcome::QuorumReached
            ) {
                Self::advance_active(&mut inner);
            }

            (outcome, origin, summary)
        };

        match outcome {
            VoteOutcome::AlreadyVoted => Ok(SkipOutcome::AlreadyVoted),
            VoteOutcome::VoteAdded(votes) => {
                self.emit(
                    &origin,
                    PlayerEvent::VoteAdded {
                        votes,
                        quorum: self.skip_quorum,
                    },
                )
                .await;
                Ok(SkipOutcome::VoteAdded {
                    votes,
                    quorum: self.skip_quorum,
                })
            }
            VoteOutcome::RequesterOverride => {
                info!(tenant = %self.tenant, voter = %voter, "Requester skipped own track");
                self.emit(
                    &origin,
                    PlayerEvent::Skipped {
                        summary,
                        reason: SkipReason::Requester,
                    },
                )
                .await;
                Ok(SkipOutcome::Skipped)
            }
            VoteOutcome::QuorumReached => {
                info!(tenant = %self.tenant, quorum = self.skip_quorum, "Skip quorum reached");
                self.emit(
                    &origin,
                    PlayerEvent::Skipped {
                        summary,
                        reason: SkipReason::Quorum,
                    },
                )
                .await;
                Ok(SkipOutcome::Skipped)
            }
        }
    }

    /// Skips the active item unconditionally, bypassing the vote count.
    pub async fn force_skip(&self, moderator: &str) -> Result<()> {
        let (origin, summary) = {
            let mut inner = self.inner.lock().await;
            self.ensure_open(&inner)?;

            let active = inner.active.as_ref().ok_or(PlaybackError::NothingPlaying)?;
            let origin = active.request.origin.clone();
            let summary = active.request.summary();

            Self::advance_active(&mut inner);

            (origin, summary)
        };

        info!(tenant = %self.tenant, moderator = %moderator, "Privileged skip");

        self.emit(
            &origin,
            PlayerEvent::Skipped {
                summary,
                reason: SkipReason::Moderator,
            },
        )
        .await;

        Ok(())
    }

    /// Holds the active item.
    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        if inner.active.is_none() {
            return Err(PlaybackError::NothingPlaying);
        }
        if inner.state == SessionState::Paused {
            return Ok(());
        }

        if let Some(connection) = inner.connection.as_mut() {
            if let Err(e) = connection.pause().await {
                warn!(tenant = %self.tenant, "Output pause failed: {}", e);
            }
        }

        inner.state = SessionState::Paused;
        Ok(())
    }

    /// Resumes a held item.
    pub async fn resume(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        if inner.active.is_none() {
            return Err(PlaybackError::NothingPlaying);
        }
        if inner.state != SessionState::Paused {
            return Ok(());
        }

        if let Some(connection) = inner.connection.as_mut() {
            if let Err(e) = connection.resume().await {
                warn!(tenant = %self.tenant, "Output resume failed: {}", e);
            }
        }

        inner.state = SessionState::Playing;
        Ok(())
    }

    /// Sets playback volume for the active and subsequent items.
    ///
    /// Returns the level actually applied after clamping.
    pub async fn set_volume(&self, level: f32) -> Result<f32> {
        let level = level.clamp(0.0, 2.0);

        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        if inner.active.is_none() {
            return Err(PlaybackError::NothingPlaying);
        }

        if let Some(connection) = inner.connection.as_mut() {
            if let Err(e) = connection.set_volume(level).await {
                warn!(tenant = %self.tenant, "Output volume change failed: {}", e);
            }
        }

        inner.volume = level;
        Ok(level)
    }

    /// Time before `requester`'s first queued item starts, counting the
    /// active item's full length.
    pub async fn eta(&self, requester: &str) -> Result<EtaOutcome> {
        let active_duration = {
            let inner = self.inner.lock().await;
            self.ensure_open(&inner)?;

            let active = inner.active.as_ref().ok_or(PlaybackError::NothingPlaying)?;
            active.request.duration_or_zero()
        };

        Ok(self.queue.eta_before(requester, active_duration).await)
    }

    /// Read-only snapshot for status and queue-listing commands.
    pub async fn status(&self) -> SessionStatus {
        let (state, now_playing, skip_votes) = {
            let inner = self.inner.lock().await;

            let now_playing = inner.active.as_ref().map(|active| {
                let track = active.request.track.as_ref();
                NowPlaying {
                    summary: active.request.summary(),
                    requester: active.request.requester.clone(),
                    title: track.map(|t| t.title.clone()),
                    uploader: track.map(|t| t.uploader.clone()),
                    duration_secs: track
                        .and_then(|t| t.duration)
                        .map(|d| d.as_secs()),
                    started_at: active.started_at,
                }
            });

            (inner.state, now_playing, inner.votes.count())
        };

        let queue = self
            .queue
            .snapshot()
            .await
            .into_iter()
            .enumerate()
            .map(|(index, request)| QueuedTrack {
                position: index + 1,
                requester: request.requester,
                query: request.query,
                title: request.track.as_ref().map(|t| t.title.clone()),
                duration_secs: request
                    .track
                    .as_ref()
                    .and_then(|t| t.duration)
                    .map(|d| d.as_secs()),
            })
            .collect();

        SessionStatus {
            tenant: self.tenant.clone(),
            state,
            now_playing,
            queue,
            queue_capacity: self.queue.capacity(),
            skip_votes,
            skip_quorum: self.skip_quorum,
        }
    }

    /// Tears the session down: cancels the loop, drains the queue, and
    /// disconnects the output. Idempotent.
    pub async fn stop(&self) -> StopOutcome {
        {
            let mut inner = self.inner.lock().await;
            if matches!(inner.state, SessionState::Stopping | SessionState::Closed) {
                return StopOutcome::AlreadyStopped;
            }
            inner.state = SessionState::Stopping;
        }

        info!(tenant = %self.tenant, "Stopping playback session");

        self.cancel.cancel();
        self.queue.clear().await;

        // Taken out of the lock so awaiting the loop cannot deadlock against
        // a loop iteration that needs the inner mutex to finish.
        let handle = self.inner.lock().await.loop_handle.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(tenant = %self.tenant, "Playback loop panicked: {}", e);
            }
        }

        let mut inner = self.inner.lock().await;
        if let Some(mut connection) = inner.connection.take() {
            if let Err(e) = connection.stop().await {
                warn!(tenant = %self.tenant, "Failed to stop output: {}", e);
            }
            if let Err(e) = connection.disconnect().await {
                warn!(tenant = %self.tenant, "Failed to disconnect output: {}", e);
            }
        }
        inner.active = None;
        inner.votes.reset();
        inner.state = SessionState::Closed;

        info!(tenant = %self.tenant, "Playback session closed");

        StopOutcome::Stopped
    }

    /// One background task per session: dequeue, resolve, play, wait for the
    /// advance signal, repeat. Runs until the cancellation token fires.
    async fn playback_loop(&self) {
        loop {
            // Between items: no active item, no carried-over votes.
            {
                let mut inner = self.inner.lock().await;
                inner.active = None;
                inner.votes.reset();
                if inner.state != SessionState::Stopping {
                    inner.state = SessionState::Idle;
                }
            }

            let request = tokio::select! {
                _ = self.cancel.cancelled() => break,
                request = self.queue.dequeue() => request,
            };

            // Authoritative resolve. Stream URLs expire, so even requests
            // resolved at enqueue time get a fresh one here.
            let track = match self.resolver.resolve(&request.query).await {
                Ok(track) => track,
                Err(e) => {
                    warn!(
                        tenant = %self.tenant,
                        query = %request.query,
                        "Dropping unresolvable request: {}",
                        e
                    );
                    self.emit(
                        &request.origin,
                        PlayerEvent::ResolutionFailed {
                            query: request.query.clone(),
                            reason: e.to_string(),
                        },
                    )
                    .await;
                    continue;
                }
            };

            let mut request = request;
            request.track = Some(track);
            let summary = request.summary();
            let origin = request.origin.clone();

            let advance = Arc::new(Notify::new());

            let played = {
                let mut guard = self.inner.lock().await;
                let inner = &mut *guard;

                let Some(connection) = inner.connection.as_mut() else {
                    warn!(
                        tenant = %self.tenant,
                        "Dropping request, no output connection"
                    );
                    self.emit_unlocked(
                        &origin,
                        PlayerEvent::PlaybackFailed {
                            summary: summary.clone(),
                            reason: "no output connection".to_string(),
                        },
                    );
                    continue;
                };

                let volume = inner.volume;
                let stream_url = request
                    .track
                    .as_ref()
                    .map(|t| t.stream_url.clone())
                    .unwrap_or_default();

                let on_complete: crate::transport::CompletionHandler = Box::new({
                    let advance = Arc::clone(&advance);
                    move || advance.notify_one()
                });

                match connection.play(&stream_url, volume, on_complete).await {
                    Ok(()) => {
                        inner.state = SessionState::Playing;
                        inner.active = Some(ActiveItem {
                            request,
                            advance: Arc::clone(&advance),
                            started_at: Utc::now(),
                        });
                        true
                    }
                    Err(e) => {
                        warn!(tenant = %self.tenant, "Playback failed: {}", e);
                        self.emit_unlocked(
                            &origin,
                            PlayerEvent::PlaybackFailed {
                                summary: summary.clone(),
                                reason: e.to_string(),
                            },
                        );
                        false
                    }
                }
            };

            if !played {
                continue;
            }

            info!(tenant = %self.tenant, summary = %summary, "Now playing");
            self.emit(&origin, PlayerEvent::NowPlaying { summary }).await;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = advance.notified() => {}
            }

            // Skip paths leave the stream running on the connection; halt it
            // before starting the next item. Harmless after natural
            // completion.
            let mut inner = self.inner.lock().await;
            if let Some(connection) = inner.connection.as_mut() {
                if let Err(e) = connection.stop().await {
                    warn!(tenant = %self.tenant, "Failed to halt finished stream: {}", e);
                }
            }
        }

        debug!(tenant = %self.tenant, "Playback loop exited");
    }

    /// Fires the advance signal for the active item, if any, and resets the
    /// vote set. Caller holds the inner lock.
    fn advance_active(inner: &mut SessionInner) {
        inner.votes.reset();
        if let Some(active) = inner.active.as_ref() {
            active.advance.notify_one();
        }
    }

    fn ensure_open(&self, inner: &SessionInner) -> Result<()> {
        match inner.state {
            SessionState::Stopping | SessionState::Closed => Err(PlaybackError::SessionClosed),
            _ => Ok(()),
        }
    }

    /// Publishes an event, logging delivery failures. Delivery never affects
    /// scheduling decisions.
    async fn emit(&self, origin: &str, event: PlayerEvent) {
        if let Err(e) = self.events.publish(&self.tenant, origin, event).await {
            warn!(tenant = %self.tenant, "Failed to publish player event: {}", e);
        }
    }

    /// Fire-and-forget emit for paths that hold the inner lock.
    fn emit_unlocked(&self, origin: &str, event: PlayerEvent) {
        let events = Arc::clone(&self.events);
        let tenant = self.tenant.clone();
        let origin = origin.to_string();
        tokio::spawn(async move {
            if let Err(e) = events.publish(&tenant, &origin, event).await {
                warn!(tenant = %tenant, "Failed to publish player event: {}", e);
            }
        });
    }
}
