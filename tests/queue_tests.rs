// Integration tests for the pending-request queue
//
// These tests verify FIFO ordering, the capacity bound, consumer wakeup,
// and the ETA arithmetic used by the eta command.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use turntable::error::PlaybackError;
use turntable::playback::{EtaOutcome, PlaybackQueue, PlaybackRequest, ResolvedTrack};

fn request(requester: &str, query: &str, duration_secs: Option<u64>) -> PlaybackRequest {
    let track = duration_secs.map(|secs| ResolvedTrack {
        stream_url: format!("sim://{}", query),
        title: query.to_string(),
        uploader: "uploader".to_string(),
        duration: Some(Duration::from_secs(secs)),
    });
    PlaybackRequest::new(requester, "origin", query, track)
}

#[tokio::test]
async fn test_enqueue_returns_one_based_positions() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    let first = queue.try_enqueue(request("alice", "a", None)).await?;
    let second = queue.try_enqueue(request("bob", "b", None)).await?;

    assert_eq!(first, 1, "First request should land at position 1");
    assert_eq!(second, 2, "Second request should land at position 2");
    assert_eq!(queue.len().await, 2);

    Ok(())
}

#[tokio::test]
async fn test_enqueue_rejects_when_full() -> Result<()> {
    let queue = PlaybackQueue::new(2);

    queue.try_enqueue(request("alice", "a", None)).await?;
    queue.try_enqueue(request("bob", "b", None)).await?;

    let result = queue.try_enqueue(request("carol", "c", None)).await;
    assert!(
        matches!(result, Err(PlaybackError::QueueFull)),
        "Third request should be rejected at capacity 2"
    );

    // The rejected request must not displace anything
    assert_eq!(queue.len().await, 2);
    let snapshot = queue.snapshot().await;
    assert_eq!(snapshot[0].requester, "alice");
    assert_eq!(snapshot[1].requester, "bob");

    Ok(())
}

#[tokio::test]
async fn test_dequeue_preserves_fifo_order() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    queue.try_enqueue(request("alice", "a", None)).await?;
    queue.try_enqueue(request("bob", "b", None)).await?;
    queue.try_enqueue(request("carol", "c", None)).await?;

    assert_eq!(queue.dequeue().await.query, "a");
    assert_eq!(queue.dequeue().await.query, "b");
    assert_eq!(queue.dequeue().await.query, "c");
    assert!(queue.is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_dequeue_wakes_on_enqueue() -> Result<()> {
    let queue = Arc::new(PlaybackQueue::new(10));

    // Consumer suspends on the empty queue
    let consumer = tokio::spawn({
        let queue = Arc::clone(&queue);
        async move { queue.dequeue().await }
    });

    // Give the consumer time to park before producing
    tokio::time::sleep(Duration::from_millis(20)).await;

    queue.try_enqueue(request("alice", "late", None)).await?;

    let dequeued = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should wake after enqueue")?;
    assert_eq!(dequeued.query, "late");

    Ok(())
}

#[tokio::test]
async fn test_eta_sums_durations_before_requester() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    // Queue: [alice 150s, carol 30s]; active item contributes 100s
    queue.try_enqueue(request("alice", "a", Some(150))).await?;
    queue.try_enqueue(request("carol", "c", Some(30))).await?;

    let outcome = queue.eta_before("carol", Duration::from_secs(100)).await;
    assert_eq!(
        outcome,
        EtaOutcome::Eta(Duration::from_secs(250)),
        "ETA should be active (100s) plus alice's item (150s)"
    );

    Ok(())
}

#[tokio::test]
async fn test_eta_front_of_queue_is_next_up() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    queue.try_enqueue(request("alice", "a", Some(150))).await?;
    queue.try_enqueue(request("bob", "b", Some(30))).await?;

    let outcome = queue.eta_before("alice", Duration::from_secs(100)).await;
    assert_eq!(outcome, EtaOutcome::NextUp);

    Ok(())
}

#[tokio::test]
async fn test_eta_missing_requester_not_in_queue() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    queue.try_enqueue(request("alice", "a", Some(150))).await?;

    let outcome = queue.eta_before("mallory", Duration::from_secs(100)).await;
    assert_eq!(outcome, EtaOutcome::NotInQueue);

    Ok(())
}

#[tokio::test]
async fn test_eta_unresolved_items_count_as_zero() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    // alice's item has no resolved duration
    queue.try_enqueue(request("alice", "a", None)).await?;
    queue.try_enqueue(request("bob", "b", Some(60))).await?;
    queue.try_enqueue(request("carol", "c", Some(30))).await?;

    let outcome = queue.eta_before("carol", Duration::from_secs(10)).await;
    assert_eq!(
        outcome,
        EtaOutcome::Eta(Duration::from_secs(70)),
        "Unresolved durations should contribute zero to the sum"
    );

    Ok(())
}

#[tokio::test]
async fn test_eta_uses_requesters_first_item() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    queue.try_enqueue(request("alice", "a", Some(100))).await?;
    queue.try_enqueue(request("bob", "b1", Some(50))).await?;
    queue.try_enqueue(request("bob", "b2", Some(50))).await?;

    // Only items strictly before bob's first request count
    let outcome = queue.eta_before("bob", Duration::from_secs(20)).await;
    assert_eq!(outcome, EtaOutcome::Eta(Duration::from_secs(120)));

    Ok(())
}

#[tokio::test]
async fn test_clear_empties_queue() -> Result<()> {
    let queue = PlaybackQueue::new(10);

    queue.try_enqueue(request("alice", "a", None)).await?;
    queue.try_enqueue(request("bob", "b", None)).await?;

    queue.clear().await;

    assert!(queue.is_empty().await, "Queue should be empty after clear");
    assert!(!queue.is_full().await);

    Ok(())
}
