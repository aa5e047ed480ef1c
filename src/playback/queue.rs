use super::request::PlaybackRequest;
use crate::error::PlaybackError;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Result of an ETA query against the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtaOutcome {
    /// The requester's item is at the front of the queue
    NextUp,

    /// The requester has no item in the queue
    NotInQueue,

    /// Total resolved duration of the active item plus every queued item
    /// strictly before the requester's first item
    Eta(Duration),
}

/// Bounded FIFO of pending playback requests for one session.
///
/// Producers never block: `try_enqueue` fails immediately when the queue is
/// at capacity. The single consumer is the session's playback loop, which
/// suspends in `dequeue` while the queue is empty.
pub struct PlaybackQueue {
    capacity: usize,
    items: Mutex<VecDeque<PlaybackRequest>>,
    enqueued: Notify,
}

impl PlaybackQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            enqueued: Notify::new(),
        }
    }

    /// Appends a request unless the queue is at capacity. Never blocks.
    ///
    /// Returns the queue position (1-based) of the accepted request.
    pub async fn try_enqueue(&self, request: PlaybackRequest) -> Result<usize, PlaybackError> {
        let position = {
            let mut items = self.items.lock().await;
            if items.len() >= self.capacity {
                return Err(PlaybackError::QueueFull);
            }
            items.push_back(request);
            items.len()
        };

        self.enqueued.notify_one();
        Ok(position)
    }

    /// Removes and returns the next request, suspending while the queue is
    /// empty.
    ///
    /// Cancellation is the caller's concern: the playback loop races this
    /// future against its cancellation token.
    pub async fn dequeue(&self) -> PlaybackRequest {
        loop {
            // Arm the notification before checking, so an enqueue landing
            // between the check and the await still wakes us.
            let notified = self.enqueued.notified();

            if let Some(request) = self.items.lock().await.pop_front() {
                return request;
            }

            notified.await;
        }
    }

    /// Read-only snapshot of the queue at a single point in time.
    pub async fn snapshot(&self) -> Vec<PlaybackRequest> {
        self.items.lock().await.iter().cloned().collect()
    }

    /// Sums resolved durations of the active item plus every queued item
    /// strictly before the requester's first item.
    ///
    /// The active item's full duration is counted regardless of how long it
    /// has been playing; the scheduler has no playback-position data.
    pub async fn eta_before(&self, requester: &str, active_duration: Duration) -> EtaOutcome {
        let items = self.items.lock().await;

        let mut total = active_duration;
        for (index, item) in items.iter().enumerate() {
            if item.requester == requester {
                if index == 0 {
                    return EtaOutcome::NextUp;
                }
                return EtaOutcome::Eta(total);
            }
            total += item.duration_or_zero();
        }

        EtaOutcome::NotInQueue
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn is_full(&self) -> bool {
        self.items.lock().await.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all pending requests (session teardown).
    pub async fn clear(&self) {
        self.items.lock().await.clear();
    }
}
