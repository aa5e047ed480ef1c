//! Simulated transport for development and integration tests
//!
//! `SimTrackResolver` resolves from a canned track table; `SimOutputSink`
//! "plays" a stream by running a timer for the track's duration and firing
//! the completion callback when it elapses. Every connection records the
//! actions taken against it so tests can assert on transport behavior.

use super::resolver::TrackResolver;
use super::sink::{CompletionHandler, OutputSink, SinkConnection};
use crate::playback::ResolvedTrack;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Canned resolver: knows exactly the tracks it was given.
///
/// In permissive mode it synthesizes a track for any query instead, which
/// is what the daemon runs with so the scheduler can be driven end to end
/// without a real media backend.
pub struct SimTrackResolver {
    tracks: HashMap<String, ResolvedTrack>,
    permissive: bool,
}

impl SimTrackResolver {
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            permissive: false,
        }
    }

    /// Resolver that accepts every query, synthesizing untimed metadata.
    pub fn permissive() -> Self {
        Self {
            tracks: HashMap::new(),
            permissive: true,
        }
    }

    /// Register a resolvable track under `query`.
    pub fn with_track(mut self, query: &str, title: &str, uploader: &str, duration: Duration) -> Self {
        self.tracks.insert(
            query.to_string(),
            ResolvedTrack {
                stream_url: format!("sim://{}", query),
                title: title.to_string(),
                uploader: uploader.to_string(),
                duration: Some(duration),
            },
        );
        self
    }

    /// Register a track whose duration the resolver cannot determine.
    pub fn with_untimed_track(mut self, query: &str, title: &str, uploader: &str) -> Self {
        self.tracks.insert(
            query.to_string(),
            ResolvedTrack {
                stream_url: format!("sim://{}", query),
                title: title.to_string(),
                uploader: uploader.to_string(),
                duration: None,
            },
        );
        self
    }
}

impl Default for SimTrackResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TrackResolver for SimTrackResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack> {
        match self.tracks.get(query) {
            Some(track) => Ok(track.clone()),
            None if self.permissive => Ok(ResolvedTrack {
                stream_url: format!("sim://{}", query),
                title: query.to_string(),
                uploader: "sim".to_string(),
                duration: None,
            }),
            None => bail!("no matching content for '{}'", query),
        }
    }

    fn name(&self) -> &str {
        "sim"
    }
}

/// Action recorded against a sim connection, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkAction {
    Connected { target: String },
    Played { stream_url: String },
    Paused,
    Resumed,
    Stopped,
    VolumeSet(f32),
    Disconnected,
}

/// Timer-driven output sink.
pub struct SimOutputSink {
    actions: Arc<Mutex<Vec<SinkAction>>>,

    /// How long every stream runs before completing naturally
    stream_duration: Duration,
}

impl SimOutputSink {
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
            stream_duration: Duration::from_millis(20),
        }
    }

    /// Overrides how long streams play before completing. Tests exercising
    /// pause or skip paths use a long duration so nothing completes
    /// naturally underneath them.
    pub fn with_stream_duration(mut self, duration: Duration) -> Self {
        self.stream_duration = duration;
        self
    }

    /// Shared action log across every connection this sink hands out.
    pub fn actions(&self) -> Arc<Mutex<Vec<SinkAction>>> {
        Arc::clone(&self.actions)
    }
}

impl Default for SimOutputSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OutputSink for SimOutputSink {
    async fn connect(&self, _tenant: &str, target: &str) -> Result<Box<dyn SinkConnection>> {
        self.actions.lock().await.push(SinkAction::Connected {
            target: target.to_string(),
        });

        Ok(Box::new(SimConnection {
            target: target.to_string(),
            actions: Arc::clone(&self.actions),
            stream_duration: self.stream_duration,
            playing: None,
        }))
    }

    fn name(&self) -> &str {
        "sim"
    }
}

struct SimPlayback {
    /// Cancels the running completion timer
    timer: CancellationToken,

    /// Completion callback, taken by whichever timer task fires first
    on_complete: Arc<std::sync::Mutex<Option<CompletionHandler>>>,

    /// Time left on the stream when paused
    remaining: Duration,

    /// When the current timer started, to compute remaining on pause
    started: Instant,

    paused: bool,
}

struct SimConnection {
    target: String,
    actions: Arc<Mutex<Vec<SinkAction>>>,
    stream_duration: Duration,
    playing: Option<SimPlayback>,
}

impl SimConnection {
    fn spawn_timer(
        remaining: Duration,
        on_complete: Arc<std::sync::Mutex<Option<CompletionHandler>>>,
    ) -> CancellationToken {
        let token = CancellationToken::new();
        let timer = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(remaining) => {
                    let handler = on_complete.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(handler) = handler {
                        handler();
                    }
                }
            }
        });

        token
    }

    fn halt_timer(&mut self) {
        if let Some(playback) = self.playing.take() {
            playback.timer.cancel();
        }
    }
}

#[async_trait::async_trait]
impl SinkConnection for SimConnection {
    async fn play(
        &mut self,
        stream_url: &str,
        _volume: f32,
        on_complete: CompletionHandler,
    ) -> Result<()> {
        self.halt_timer();

        self.actions.lock().await.push(SinkAction::Played {
            stream_url: stream_url.to_string(),
        });

        let handler = Arc::new(std::sync::Mutex::new(Some(on_complete)));
        let timer = Self::spawn_timer(self.stream_duration, Arc::clone(&handler));

        self.playing = Some(SimPlayback {
            timer,
            on_complete: handler,
            remaining: self.stream_duration,
            started: Instant::now(),
            paused: false,
        });

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.halt_timer();
        self.actions.lock().await.push(SinkAction::Stopped);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        if let Some(playback) = self.playing.as_mut() {
            if !playback.paused {
                playback.timer.cancel();
                playback.remaining = playback
                    .remaining
                    .saturating_sub(playback.started.elapsed());
                playback.paused = true;
            }
        }
        self.actions.lock().await.push(SinkAction::Paused);
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        if let Some(playback) = self.playing.as_mut() {
            if playback.paused {
                playback.timer =
                    Self::spawn_timer(playback.remaining, Arc::clone(&playback.on_complete));
                playback.started = Instant::now();
                playback.paused = false;
            }
        }
        self.actions.lock().await.push(SinkAction::Resumed);
        Ok(())
    }

    async fn set_volume(&mut self, level: f32) -> Result<()> {
        self.actions.lock().await.push(SinkAction::VolumeSet(level));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.halt_timer();
        self.actions.lock().await.push(SinkAction::Disconnected);
        Ok(())
    }

    fn target(&self) -> &str {
        &self.target
    }
}
