//! External collaborator seams: track resolution and audio output
//!
//! The scheduler core never touches audio bytes. It talks to two traits:
//! - `TrackResolver` - turns a free-text query or URL into a playable
//!   stream handle plus metadata
//! - `OutputSink` / `SinkConnection` - the transport a session streams
//!   through (join, play, pause, volume, disconnect)
//!
//! `sim` provides timer-driven implementations for development and tests.

mod resolver;
pub mod sim;
mod sink;

pub use resolver::TrackResolver;
pub use sim::{SimOutputSink, SimTrackResolver, SinkAction};
pub use sink::{CompletionHandler, OutputSink, SinkConnection};
