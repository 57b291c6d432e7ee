mod common;

use std::sync::Arc;

use common::{cache_with, FakeSource, ManualClock};

#[tokio::test]
async fn two_calls_within_ttl_return_same_snapshot() {
    let source = Arc::new(FakeSource::new(65_000.0));
    let clock = Arc::new(ManualClock::new());
    let cache = cache_with(source.clone(), clock.clone());

    let first = cache.get_or_fetch().await.unwrap();
    clock.advance_secs(29);
    let second = cache.get_or_fetch().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn call_after_ttl_refreshes() {
    let source = Arc::new(FakeSource::new(65_000.0));
    let clock = Arc::new(ManualClock::new());
    let cache = cache_with(source.clone(), clock.clone());

    let first = cache.get_or_fetch().await.unwrap();
    source.set_price(66_000.0);
    clock.advance_secs(30);
    let second = cache.get_or_fetch().await.unwrap();

    assert_eq!(source.calls(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.usd, 66_000.0);
    assert!(second.last_updated > first.last_updated);
}

#[tokio::test]
async fn failed_refresh_serves_stale_snapshot() {
    let source = Arc::new(FakeSource::new(65_000.0));
    let clock = Arc::new(ManualClock::new());
    let cache = cache_with(source.clone(), clock.clone());

    let first = cache.get_or_fetch().await.unwrap();
    source.set_failing(true);
    clock.advance_secs(120);

    let stale = cache.get_or_fetch().await.unwrap();
    assert!(Arc::ptr_eq(&first, &stale));
    assert_eq!(source.calls(), 2);

    // still stale, so the next call tries upstream again
    let again = cache.get_or_fetch().await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn failed_first_fetch_propagates() {
    let source = Arc::new(FakeSource::new(65_000.0));
    source.set_failing(true);
    let cache = cache_with(source.clone(), Arc::new(ManualClock::new()));

    let err = cache.get_or_fetch().await.unwrap_err();
    assert!(err.to_string().contains("429"));
    assert!(cache.cached().is_none());
}

#[tokio::test]
async fn snapshot_is_stamped_with_clock_time() {
    let source = Arc::new(FakeSource::new(42_000.0));
    let clock = Arc::new(ManualClock::new());
    let cache = cache_with(source, clock.clone());

    let snap = cache.get_or_fetch().await.unwrap();
    assert_eq!(snap.last_updated, cryptopulse::services::price_cache::Clock::now(clock.as_ref()));
    assert_eq!(snap.brl, 210_000.0);
    assert!(Arc::ptr_eq(&snap, &cache.cached().unwrap()));
}
