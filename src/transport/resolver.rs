use crate::playback::ResolvedTrack;
use anyhow::Result;

/// Resolves a free-text query or URL to a playable stream and metadata.
///
/// The scheduler calls this twice per request: once at enqueue time for
/// metadata (failure there only defers resolution), and once in the playback
/// loop right before playing, because resolved stream URLs can expire while
/// a request waits in the queue. The loop's call is the authoritative one.
#[async_trait::async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve `query` to a playable track.
    ///
    /// Errors mean "this request cannot play" (invalid URL, no matching
    /// content, network failure) and are reported to the request's origin.
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack>;

    /// Resolver name for logging
    fn name(&self) -> &str;
}
