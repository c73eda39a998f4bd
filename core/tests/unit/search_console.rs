//! Repository search and console broker tests.

use chrono::Duration;
use flotilla_common::RepoResult;
use flotilla_core::application::services::console::ConsoleBroker;
use flotilla_core::application::services::search;
use flotilla_core::domain::error::{ContainerError, SelectionError, SessionError};

use crate::mocks::{
    FirstSelector, MemoryRegistry, MockConnector, SeqTokenSource, container, disabled_host, host,
};

fn repo(name: &str) -> RepoResult {
    RepoResult {
        name: name.to_string(),
        description: String::new(),
        star_count: 0,
        is_official: false,
        is_automated: false,
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_proxies_through_one_enabled_host() {
    let connector = MockConnector::new().with_repos(vec![repo("redis"), repo("redis-alpine")]);
    let store = MemoryRegistry::new()
        .with_host(host("alpha"))
        .with_host(host("beta"));

    let results = search::search_repository(&connector, &store, &FirstSelector, "redis")
        .await
        .expect("search succeeds");

    assert_eq!(results.len(), 2);
    assert_eq!(connector.calls(), ["connect:alpha", "search:alpha:redis"]);
}

#[tokio::test]
async fn search_with_no_enabled_hosts_makes_no_network_call() {
    let connector = MockConnector::new();
    let store = MemoryRegistry::new().with_host(disabled_host("alpha"));

    let err = search::search_repository(&connector, &store, &FirstSelector, "redis")
        .await
        .expect_err("nothing to search through");

    assert_eq!(
        err.downcast_ref::<SelectionError>(),
        Some(&SelectionError::NoHostsAvailable)
    );
    assert!(connector.calls().is_empty());
}

// ── Console sessions ──────────────────────────────────────────────────────────

fn seeded_store() -> MemoryRegistry {
    MemoryRegistry::new()
        .with_host(host("alpha"))
        .with_container(container("c1", "alpha"))
}

#[tokio::test]
async fn session_binds_host_and_container_and_is_single_use() {
    let broker = ConsoleBroker::new(SeqTokenSource::default(), Duration::minutes(15));
    let store = seeded_store();

    let token = broker
        .create_session(&store, "alpha", "c1")
        .await
        .expect("session issued");

    let session = broker.take_session(&token).await.expect("first take");
    assert_eq!(session.host, "alpha");
    assert_eq!(session.container_id, "c1");

    let err = broker.take_session(&token).await.expect_err("second take");
    assert_eq!(err, SessionError::Unknown);
}

#[tokio::test]
async fn session_for_container_on_another_host_is_refused() {
    let broker = ConsoleBroker::new(SeqTokenSource::default(), Duration::minutes(15));
    let store = seeded_store().with_host(host("beta"));

    let err = broker
        .create_session(&store, "beta", "c1")
        .await
        .expect_err("c1 lives on alpha");

    assert_eq!(
        err.downcast_ref::<ContainerError>(),
        Some(&ContainerError::NotFound("c1".to_string()))
    );
}

#[tokio::test]
async fn expired_session_cannot_be_taken() {
    // Negative TTL: every session is already expired when issued.
    let broker = ConsoleBroker::new(SeqTokenSource::default(), Duration::seconds(-1));
    let store = seeded_store();

    let token = broker
        .create_session(&store, "alpha", "c1")
        .await
        .expect("session issued");

    let err = broker.take_session(&token).await.expect_err("expired");
    assert_eq!(err, SessionError::Expired);
}

#[tokio::test]
async fn prune_drops_only_expired_sessions() {
    let store = seeded_store();

    let fresh = ConsoleBroker::new(SeqTokenSource::default(), Duration::minutes(15));
    let token = fresh
        .create_session(&store, "alpha", "c1")
        .await
        .expect("session issued");
    assert_eq!(fresh.prune_expired().await, 0);
    fresh.take_session(&token).await.expect("still claimable");

    let expired = ConsoleBroker::new(SeqTokenSource::default(), Duration::seconds(-1));
    expired
        .create_session(&store, "alpha", "c1")
        .await
        .expect("session issued");
    assert_eq!(expired.prune_expired().await, 1);
}
