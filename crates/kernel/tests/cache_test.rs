#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Request-scoped caching and globals loading over counting stores.

use std::sync::Arc;

use tessera_kernel::content::{
    Collection, Footer, Header, PageResolver, SiteChrome, load_globals,
};
use tessera_kernel::store::{CachedStore, ContentStore, Depth};
use tessera_test_utils::{CountingStore, FailingStore, seeded_store};

fn counting() -> Arc<CountingStore> {
    Arc::new(CountingStore::new(Arc::new(seeded_store())))
}

#[tokio::test]
async fn identical_resolves_hit_store_once() {
    let inner = counting();
    let cache = CachedStore::new(inner.clone());
    let resolver = PageResolver::new(&cache);

    let first = resolver
        .resolve(Collection::Pages, "about", Depth::DETAIL)
        .await
        .unwrap()
        .unwrap();
    let second = resolver
        .resolve(Collection::Pages, "about", Depth::DETAIL)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(inner.finds(), 1);
}

#[tokio::test]
async fn different_arguments_are_separate_entries() {
    let inner = counting();
    let cache = CachedStore::new(inner.clone());
    let resolver = PageResolver::new(&cache);

    resolver
        .resolve(Collection::Pages, "about", Depth::DETAIL)
        .await
        .unwrap();
    resolver
        .resolve(Collection::Pages, "about", Depth::LISTING)
        .await
        .unwrap();
    resolver
        .resolve(Collection::ServicePages, "about", Depth::DETAIL)
        .await
        .unwrap();

    assert_eq!(inner.finds(), 3);
}

#[tokio::test]
async fn concurrent_identical_calls_are_coalesced() {
    let inner = counting();
    let cache = CachedStore::new(inner.clone());
    let resolver = PageResolver::new(&cache);

    let (a, b) = tokio::join!(
        resolver.resolve(Collection::Pages, "home", Depth::DETAIL),
        resolver.resolve(Collection::Pages, "home", Depth::DETAIL)
    );
    assert!(a.unwrap().is_some());
    assert!(b.unwrap().is_some());
    assert_eq!(inner.finds(), 1);
}

#[tokio::test]
async fn caches_do_not_outlive_their_request() {
    let inner = counting();

    for _ in 0..2 {
        let cache = CachedStore::new(inner.clone());
        load_globals(&cache).await;
        load_globals(&cache).await;
    }

    // Header and footer once per request.
    assert_eq!(inner.globals(), 4);
}

#[tokio::test]
async fn errors_are_not_cached() {
    let inner = Arc::new(CountingStore::new(Arc::new(FailingStore)));
    let cache = CachedStore::new(inner.clone());

    assert!(cache.find_global("header").await.is_err());
    assert!(cache.find_global("header").await.is_err());
    assert_eq!(inner.globals(), 2);
}

#[tokio::test]
async fn globals_fall_back_when_store_fails() {
    let chrome = load_globals(&FailingStore).await;
    assert_eq!(chrome, SiteChrome::fallback());
    assert_eq!(chrome.header, Header::fallback());
    assert_eq!(chrome.footer, Footer::fallback());
}
