use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::time::Duration;

use chrono::Utc;
use clipshelf_client::{AlbumFilter, Shelf, StoreConfig, watch_user_bookmarks};
use satchel::memory::MemoryBackend;
use satchel::{EventHandler, Realtime, RealtimeEvent, Subscription};
use serde_json::json;
use tokio::task::yield_now;
use tokio::time::advance;

fn test_config() -> StoreConfig {
    StoreConfig {
        database_id: "main".to_string(),
        videos_collection: "videos".to_string(),
        bookmarks_collection: "bookmarks".to_string(),
        albums_collection: "albums".to_string(),
    }
}

fn shelf() -> (MemoryBackend, Shelf<MemoryBackend>) {
    let backend = MemoryBackend::new("main");
    (backend.clone(), Shelf::new(backend, test_config()))
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    (count, move || {
        hits.fetch_add(1, Relaxed);
    })
}

/// Lets armed timer tasks register their sleeps, moves the paused clock, then
/// lets whatever fired run.
async fn settle(duration: Duration) {
    yield_now().await;
    advance(duration).await;
    yield_now().await;
}

/// Feed whose teardown hands the handler one final event, standing in for a
/// delivery that is already in flight when the consumer unsubscribes.
struct FinalEventFeed {
    event: RealtimeEvent,
}

impl Realtime for FinalEventFeed {
    fn subscribe(&self, _channel: &str, mut handler: EventHandler) -> Subscription {
        let event = self.event.clone();
        Subscription::new(move || handler(&event))
    }
}

#[tokio::test(start_paused = true)]
async fn test_event_burst_coalesces_into_one_refresh() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let _watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);

    for video in ["v1", "v2", "v3"] {
        shelf
            .create_or_update_bookmark("u1", video, None)
            .await
            .unwrap();
    }

    settle(Duration::from_millis(300)).await;
    assert_eq!(count.load(Relaxed), 1);

    // quiet afterwards
    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_measures_from_the_last_event() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let _watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);

    shelf
        .create_or_update_bookmark("u1", "v1", None)
        .await
        .unwrap();
    settle(Duration::from_millis(200)).await;
    assert_eq!(count.load(Relaxed), 0);

    // a second change inside the window pushes the refresh out
    shelf
        .create_or_update_bookmark("u1", "v1", Some("x"))
        .await
        .unwrap();
    settle(Duration::from_millis(200)).await;
    assert_eq!(count.load(Relaxed), 0);

    settle(Duration::from_millis(100)).await;
    assert_eq!(count.load(Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_other_users_and_non_document_events_are_ignored() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let _watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);

    shelf
        .create_or_update_bookmark("u2", "v1", None)
        .await
        .unwrap();

    // connection chatter on the bookmark channel, not a document change
    store.publish(RealtimeEvent {
        events: vec!["connections.main.create".to_string()],
        channels: vec![store.channel("bookmarks")],
        timestamp: Utc::now(),
        payload: json!({ "user": "u1" }),
    });

    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn test_watch_without_user_is_inert() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let mut watch = watch_user_bookmarks(&store, shelf.config(), "   ", on_change);
    assert!(!watch.is_active());

    shelf
        .create_or_update_bookmark("u1", "v1", None)
        .await
        .unwrap();
    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);

    watch.unsubscribe();
    watch.unsubscribe();
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_suppresses_a_pending_refresh() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let mut watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);
    assert!(watch.is_active());

    shelf
        .create_or_update_bookmark("u1", "v1", None)
        .await
        .unwrap();
    yield_now().await;

    watch.unsubscribe();
    assert!(!watch.is_active());
    watch.unsubscribe();

    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);

    // later changes no longer reach the handler either
    shelf
        .create_or_update_bookmark("u1", "v2", None)
        .await
        .unwrap();
    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_watch_suppresses_a_pending_refresh() {
    let (store, shelf) = shelf();
    let (count, on_change) = counter();
    let watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);

    shelf
        .create_or_update_bookmark("u1", "v1", None)
        .await
        .unwrap();
    yield_now().await;

    drop(watch);
    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_racing_teardown_never_fires() {
    let feed = FinalEventFeed {
        event: RealtimeEvent {
            events: vec![
                "databases.main.collections.bookmarks.documents.b1.update".to_string(),
            ],
            channels: vec!["databases.main.collections.bookmarks.documents".to_string()],
            timestamp: Utc::now(),
            payload: json!({ "user": "u1" }),
        },
    };
    let (count, on_change) = counter();
    let mut watch = watch_user_bookmarks(&feed, &test_config(), "u1", on_change);
    assert!(watch.is_active());

    // the parting event re-arms the timer mid-teardown; the refresh must
    // still be suppressed
    watch.unsubscribe();
    settle(Duration::from_millis(1000)).await;
    assert_eq!(count.load(Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn test_orphan_cleanup_burst_triggers_one_refresh() {
    let (store, shelf) = shelf();
    for video in ["gone-1", "gone-2", "gone-3"] {
        shelf
            .create_or_update_bookmark("u1", video, None)
            .await
            .unwrap();
    }

    let (count, on_change) = counter();
    let _watch = watch_user_bookmarks(&store, shelf.config(), "u1", on_change);

    let scan = shelf.scan_orphans("u1", &AlbumFilter::All).await.unwrap();
    assert_eq!(scan.orphans.len(), 3);
    let outcome = shelf.clean_orphans(&scan.orphans).await;
    assert_eq!(outcome.summary(), "removed 3 of 3");

    settle(Duration::from_millis(300)).await;
    assert_eq!(count.load(Relaxed), 1);
}
