use anyhow::Result;

/// Callback fired exactly once when a stream finishes on its own.
///
/// Explicit `stop` calls do not fire it; the scheduler owns the advance
/// decision on those paths.
pub type CompletionHandler = Box<dyn FnOnce() + Send + 'static>;

/// Factory for per-session output connections.
#[async_trait::async_trait]
pub trait OutputSink: Send + Sync {
    /// Connect to `target` on behalf of `tenant`, returning a live
    /// connection. One connection per session; relocation is handled by the
    /// session (disconnect old, connect new).
    async fn connect(&self, tenant: &str, target: &str) -> Result<Box<dyn SinkConnection>>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// One live output connection for one session.
#[async_trait::async_trait]
pub trait SinkConnection: Send + Sync {
    /// Start streaming `stream_url` at `volume`, firing `on_complete` when
    /// the stream ends naturally. A fatal transport failure mid-stream must
    /// also fire `on_complete` (the scheduler treats it as completion).
    async fn play(
        &mut self,
        stream_url: &str,
        volume: f32,
        on_complete: CompletionHandler,
    ) -> Result<()>;

    /// Halt the current stream without firing `on_complete`.
    async fn stop(&mut self) -> Result<()>;

    /// Hold the current stream, retaining resources.
    async fn pause(&mut self) -> Result<()>;

    /// Resume a held stream.
    async fn resume(&mut self) -> Result<()>;

    /// Adjust volume of the current and subsequent streams.
    async fn set_volume(&mut self, level: f32) -> Result<()>;

    /// Tear the connection down. The connection is unusable afterwards.
    async fn disconnect(&mut self) -> Result<()>;

    /// The output target this connection is attached to
    fn target(&self) -> &str;
}
