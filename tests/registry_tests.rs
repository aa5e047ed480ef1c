// Integration tests for the session registry
//
// These tests verify tenant isolation, atomic get-or-create, session
// replacement after teardown, and the shutdown path that stops every
// session.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use turntable::config::SchedulerConfig;
use turntable::error::PlaybackError;
use turntable::events::ChannelPublisher;
use turntable::session::{SessionRegistry, SessionState, StopOutcome};
use turntable::transport::{SimOutputSink, SimTrackResolver};

fn registry() -> SessionRegistry {
    registry_with_resolver(SimTrackResolver::new())
}

fn registry_with_resolver(resolver: SimTrackResolver) -> SessionRegistry {
    let sink = SimOutputSink::new().with_stream_duration(Duration::from_secs(60));
    let (publisher, _events) = ChannelPublisher::new();

    SessionRegistry::new(
        SchedulerConfig::default(),
        Arc::new(resolver),
        Arc::new(sink),
        Arc::new(publisher),
    )
}

#[tokio::test]
async fn test_get_or_create_reuses_live_session() -> Result<()> {
    let registry = registry();

    let first = registry.get_or_create("guild-1").await;
    let second = registry.get_or_create("guild-1").await;

    assert!(
        Arc::ptr_eq(&first, &second),
        "Repeated get_or_create should return the same session"
    );
    assert_eq!(registry.session_count().await, 1);

    registry.teardown_all().await;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_get_or_create_single_session() -> Result<()> {
    let registry = Arc::new(registry());

    let (a, b) = tokio::join!(
        {
            let registry = Arc::clone(&registry);
            async move { registry.get_or_create("guild-1").await }
        },
        {
            let registry = Arc::clone(&registry);
            async move { registry.get_or_create("guild-1").await }
        }
    );

    assert!(
        Arc::ptr_eq(&a, &b),
        "Concurrent creation for one tenant must not race"
    );
    assert_eq!(registry.session_count().await, 1);

    registry.teardown_all().await;
    Ok(())
}

#[tokio::test]
async fn test_tenants_are_isolated() -> Result<()> {
    let resolver = SimTrackResolver::new()
        .with_track("a", "Track A", "Uploader", Duration::from_secs(100));
    let registry = registry_with_resolver(resolver);

    registry.join("guild-1", "vc-1").await?;
    registry.join("guild-2", "vc-9").await?;
    registry.enqueue("guild-1", "alice", "chan", "a").await?;

    assert_eq!(registry.session_count().await, 2);

    // Wait for guild-1's playback loop to pick the request up
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let status = registry.status("guild-1").await.expect("session exists");
        if status.now_playing.is_some() {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("timed out waiting for guild-1 playback");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // guild-2 never got a request; a skip there has nothing to act on
    let result = registry.skip("guild-2", "bob").await;
    assert!(
        matches!(result, Err(PlaybackError::NothingPlaying)),
        "A skip in an idle tenant should fail"
    );

    // guild-1's item is active and votable
    let outcome = registry.skip("guild-1", "bob").await?;
    assert_eq!(
        outcome,
        turntable::session::SkipOutcome::VoteAdded { votes: 1, quorum: 3 }
    );

    registry.teardown_all().await;
    Ok(())
}

#[tokio::test]
async fn test_commands_for_unknown_tenant_fail() -> Result<()> {
    let registry = registry();

    assert!(matches!(
        registry.skip("nowhere", "bob").await,
        Err(PlaybackError::NothingPlaying)
    ));
    assert!(matches!(
        registry.pause("nowhere").await,
        Err(PlaybackError::NothingPlaying)
    ));
    assert!(matches!(
        registry.eta("nowhere", "bob").await,
        Err(PlaybackError::NothingPlaying)
    ));
    assert!(registry.status("nowhere").await.is_none());

    // Unknown tenants never create sessions as a side effect
    assert_eq!(registry.session_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_stop_removes_session() -> Result<()> {
    let registry = registry();

    registry.join("guild-1", "vc-1").await?;
    assert_eq!(registry.session_count().await, 1);

    assert_eq!(registry.stop("guild-1").await, StopOutcome::Stopped);
    assert_eq!(registry.session_count().await, 0);
    assert!(registry.status("guild-1").await.is_none());

    // Stopping again reports there was nothing to stop
    assert_eq!(registry.stop("guild-1").await, StopOutcome::AlreadyStopped);

    Ok(())
}

#[tokio::test]
async fn test_stopped_session_is_replaced() -> Result<()> {
    let registry = registry();

    let first = registry.get_or_create("guild-1").await;
    registry.stop("guild-1").await;

    let second = registry.get_or_create("guild-1").await;

    assert!(
        !Arc::ptr_eq(&first, &second),
        "A stopped session must not be handed out again"
    );
    assert_eq!(first.state().await, SessionState::Closed);
    assert_eq!(second.state().await, SessionState::Idle);

    registry.teardown_all().await;
    Ok(())
}

#[tokio::test]
async fn test_teardown_all_stops_every_session() -> Result<()> {
    let registry = registry();

    let a = registry.get_or_create("guild-1").await;
    let b = registry.get_or_create("guild-2").await;
    let c = registry.get_or_create("guild-3").await;

    registry.teardown_all().await;

    assert_eq!(registry.session_count().await, 0);
    for session in [a, b, c] {
        assert_eq!(
            session.state().await,
            SessionState::Closed,
            "Every session should be closed after teardown"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_teardown_all_with_no_sessions() -> Result<()> {
    let registry = registry();

    // Nothing to do, nothing to panic over
    registry.teardown_all().await;
    assert_eq!(registry.session_count().await, 0);

    Ok(())
}
