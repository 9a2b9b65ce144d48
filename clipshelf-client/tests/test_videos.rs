use clipshelf_client::{AlbumFilter, Shelf, StoreConfig, StoreError, VideoChanges};
use satchel::memory::MemoryBackend;
use satchel::{Document, DocumentStore, Permission, Query};
use serde_json::{Value, json};

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

async fn seed_video(store: &MemoryBackend, title: &str, creator: &str) -> String {
    store
        .create(
            "videos",
            json!({
                "title": title,
                "thumbnail": "https://cdn.example/thumb.png",
                "video": "https://cdn.example/clip.mp4",
                "creator": creator,
            }),
            &[],
        )
        .await
        .unwrap()
        .id
}

/// Store with no full-text index: search queries error, everything else
/// passes through.
struct UnindexedStore {
    backing: MemoryBackend,
}

impl DocumentStore for UnindexedStore {
    async fn list(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        if queries.iter().any(|query| matches!(query, Query::Search { .. })) {
            return Err(StoreError::Io("no fulltext index on title".to_string()));
        }
        self.backing.list(collection, queries).await
    }

    async fn create(
        &self,
        collection: &str,
        data: Value,
        permissions: &[Permission],
    ) -> Result<Document, StoreError> {
        self.backing.create(collection, data, permissions).await
    }

    async fn update(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.backing.update(collection, document_id, data).await
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        self.backing.delete(collection, document_id).await
    }
}

#[tokio::test]
async fn test_latest_feed_is_newest_first_and_limited() {
    let (store, shelf) = shelf();
    for title in ["one", "two", "three", "four", "five"] {
        seed_video(&store, title, "p1").await;
    }

    let latest = shelf.list_latest_videos(3).await.unwrap();
    let titles: Vec<_> = latest.iter().map(|video| video.title.as_str()).collect();
    assert_eq!(titles, ["five", "four", "three"]);

    let all = shelf.list_all_videos().await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].title, "five");
    assert_eq!(all[4].title, "one");
}

#[tokio::test]
async fn test_search_matches_title_substring_any_case() {
    let (store, shelf) = shelf();
    seed_video(&store, "Desert Cats", "p1").await;
    seed_video(&store, "dog diaries", "p1").await;
    seed_video(&store, "CATS of cairo", "p2").await;

    let found = shelf.search_videos("cats").await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|video| video.title.to_lowercase().contains("cats")));

    assert!(shelf.search_videos("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_scans_when_the_store_has_no_index() {
    let backing = MemoryBackend::new("main");
    let shelf = Shelf::new(
        UnindexedStore {
            backing: backing.clone(),
        },
        test_config(),
    );
    seed_video(&backing, "Desert Cats", "p1").await;
    seed_video(&backing, "dog diaries", "p1").await;

    let found = shelf.search_videos("cats").await.unwrap();
    let titles: Vec<_> = found.iter().map(|video| video.title.as_str()).collect();
    assert_eq!(titles, ["Desert Cats"]);
}

#[tokio::test]
async fn test_user_videos_scoped_to_creator() {
    let (store, shelf) = shelf();
    seed_video(&store, "mine", "p1").await;
    seed_video(&store, "theirs", "p2").await;
    seed_video(&store, "also mine", "p1").await;

    let videos = shelf.list_user_videos("p1").await.unwrap();
    let titles: Vec<_> = videos.iter().map(|video| video.title.as_str()).collect();
    assert_eq!(titles, ["also mine", "mine"]);
    assert!(videos.iter().all(|video| video.creator_id == "p1"));
}

#[tokio::test]
async fn test_update_video_partial_changes() {
    let (store, shelf) = shelf();
    let video = seed_video(&store, "draft cut", "p1").await;

    let retitled = shelf
        .update_video(
            &video,
            &VideoChanges {
                title: Some("  final cut  ".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(retitled.title, "final cut");

    let described = shelf
        .update_video(
            &video,
            &VideoChanges {
                title: None,
                description: Some("the good one".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(described.title, "final cut");
    assert_eq!(described.description.as_deref(), Some("the good one"));

    let cleared = shelf
        .update_video(
            &video,
            &VideoChanges {
                title: None,
                description: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);
}

#[tokio::test]
async fn test_update_video_rejects_blank_title_and_missing_id() {
    let (store, shelf) = shelf();
    let video = seed_video(&store, "keeper", "p1").await;

    let rejected = shelf
        .update_video(
            &video,
            &VideoChanges {
                title: Some("   ".to_string()),
                description: None,
            },
        )
        .await;
    assert!(matches!(rejected, Err(StoreError::Validation(_))));

    let missing = shelf
        .update_video(
            "ghost",
            &VideoChanges {
                title: Some("encore".to_string()),
                description: None,
            },
        )
        .await;
    assert!(missing.err().is_some_and(|e| e.is_not_found()));
}

#[tokio::test]
async fn test_delete_video_cascades_across_users() {
    let (store, shelf) = shelf();
    let video = seed_video(&store, "short lived", "p1").await;
    shelf
        .create_or_update_bookmark("u1", &video, None)
        .await
        .unwrap();
    shelf
        .create_or_update_bookmark("u2", &video, Some("x"))
        .await
        .unwrap();

    let outcome = shelf.delete_video(&video).await.unwrap();
    assert_eq!(outcome.removed(), 2);
    assert!(outcome.failed.is_empty());

    assert!(shelf.list_all_videos().await.unwrap().is_empty());
    assert!(shelf.list_raw_bookmarks("u1").await.is_empty());
    assert!(shelf.list_raw_bookmarks("u2").await.is_empty());
}

#[tokio::test]
async fn test_partial_cascade_leaves_orphans_behind() {
    let (store, shelf) = shelf();
    let video = seed_video(&store, "short lived", "p1").await;
    shelf
        .create_or_update_bookmark("u1", &video, None)
        .await
        .unwrap();
    shelf
        .create_or_update_bookmark("u2", &video, None)
        .await
        .unwrap();

    store.set_principal(Some("u1"));
    let outcome = shelf.delete_video(&video).await.unwrap();
    assert_eq!(outcome.removed(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].error.is_permission());

    // u2 is now holding an orphan the next scan will surface
    let scan = shelf.scan_orphans("u2", &AlbumFilter::All).await.unwrap();
    assert_eq!(scan.orphans.len(), 1);
    assert_eq!(scan.orphans[0].video_id, video);
}
