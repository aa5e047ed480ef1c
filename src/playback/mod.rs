//! Queueing and vote-skip primitives owned by a voice session
//!
//! This module provides:
//! - `PlaybackRequest` / `ResolvedTrack` - one queued play request and its
//!   resolved metadata
//! - `PlaybackQueue` - the bounded FIFO of pending requests
//! - `SkipVotes` - the voter set for the currently active item

mod queue;
mod request;
mod votes;

pub use queue::{EtaOutcome, PlaybackQueue};
pub use request::{PlaybackRequest, ResolvedTrack};
pub use votes::{SkipVotes, VoteOutcome};
