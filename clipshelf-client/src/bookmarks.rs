//! Bookmark store access: the save/unsave surface of the app.

use std::collections::HashMap;

use indexmap::IndexSet;
use satchel::{DocumentStore, Query, StoreError};
use serde_json::json;

use crate::model::{AlbumFilter, BookmarkRecord, VideoRecord, normalize_album};
use crate::outcome::BulkOutcome;
use crate::{Shelf, owner_permissions};

/// Chunk size for `$id` membership lookups, matching the hosted service's
/// per-query value limit.
const VIDEO_LOOKUP_CHUNK: usize = 100;

impl<S: DocumentStore> Shelf<S> {
    /// Saves a video for a user, filing it under `album_id` (or unassigned).
    ///
    /// One bookmark per user/video pair: if a record already exists only its
    /// album reference is overwritten. The check and the write are separate
    /// store calls with no transaction around them, so two racing saves can
    /// still produce a duplicate row; the store offers no uniqueness
    /// constraint and readers tolerate the duplicate.
    pub async fn create_or_update_bookmark(
        &self,
        user_id: &str,
        video_id: &str,
        album_id: Option<&str>,
    ) -> Result<BookmarkRecord, StoreError> {
        let user_id = user_id.trim();
        let video_id = video_id.trim();
        if user_id.is_empty() {
            return Err(StoreError::Validation(
                "user id must not be empty".to_string(),
            ));
        }
        if video_id.is_empty() {
            return Err(StoreError::Validation(
                "video id must not be empty".to_string(),
            ));
        }
        let album_id = normalize_album(album_id);

        let existing = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[
                    Query::equal("user", user_id),
                    Query::equal("video", video_id),
                    Query::limit(1),
                ],
            )
            .await?;

        let document = match existing.first() {
            Some(found) => {
                self.store
                    .update(
                        &self.config.bookmarks_collection,
                        &found.id,
                        json!({ "album": album_id }),
                    )
                    .await?
            }
            None => {
                self.store
                    .create(
                        &self.config.bookmarks_collection,
                        json!({
                            "user": user_id,
                            "video": video_id,
                            "album": album_id,
                        }),
                        &owner_permissions(user_id),
                    )
                    .await?
            }
        };
        Ok(BookmarkRecord::from_document(&document))
    }

    /// Removes a single bookmark by id. In bulk flows a failure here usually
    /// means the row belongs to someone else; callers decide how hard to
    /// treat it.
    pub async fn delete_bookmark(&self, bookmark_id: &str) -> Result<(), StoreError> {
        self.store
            .delete(&self.config.bookmarks_collection, bookmark_id)
            .await
    }

    /// Removes one user's bookmark rows for a video, returning how many went
    /// away. A row that vanished first still counts as removed.
    pub async fn delete_bookmarks_by_video(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<u32, StoreError> {
        let matching = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[
                    Query::equal("user", user_id),
                    Query::equal("video", video_id),
                ],
            )
            .await?;

        let mut removed = 0;
        for document in &matching {
            match self.delete_bookmark(&document.id).await {
                Ok(()) => removed += 1,
                Err(error) if error.is_not_found() => removed += 1,
                Err(error) => return Err(error),
            }
        }
        Ok(removed)
    }

    /// Removes every user's bookmark of a video, best-effort. Used by the
    /// video deletion cascade, where most rows belong to other users and the
    /// acting principal may not be allowed to touch them.
    pub async fn delete_all_bookmarks_for_video(
        &self,
        video_id: &str,
    ) -> Result<BulkOutcome, StoreError> {
        let matching = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[Query::equal("video", video_id)],
            )
            .await?;

        let mut outcome = BulkOutcome::default();
        for document in &matching {
            match self.delete_bookmark(&document.id).await {
                Ok(()) => outcome.record(&document.id, Ok(())),
                Err(error) if error.is_not_found() => outcome.record(&document.id, Ok(())),
                Err(error) => {
                    log::error!(
                        "removing bookmark {} of video {video_id} failed: {error}",
                        document.id
                    );
                    outcome.record(&document.id, Err(error));
                }
            }
        }
        Ok(outcome)
    }

    /// Every bookmark a user owns, unfiltered. This is the source feed for
    /// orphan detection and count aggregation, so it degrades to empty
    /// instead of failing.
    pub async fn list_raw_bookmarks(&self, user_id: &str) -> Vec<BookmarkRecord> {
        let listed = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[Query::equal("user", user_id)],
            )
            .await;
        match listed {
            Ok(documents) => documents.iter().map(BookmarkRecord::from_document).collect(),
            Err(error) => {
                log::warn!("listing bookmarks for {user_id} failed: {error}");
                Vec::new()
            }
        }
    }

    /// The user's bookmarks under an album filter.
    pub async fn list_bookmarks_in_album(
        &self,
        user_id: &str,
        filter: &AlbumFilter,
    ) -> Result<Vec<BookmarkRecord>, StoreError> {
        let mut queries = vec![Query::equal("user", user_id)];
        match filter {
            AlbumFilter::All => {}
            AlbumFilter::Unassigned => queries.push(Query::is_null("album")),
            AlbumFilter::Album(album_id) => {
                queries.push(Query::equal("album", album_id.as_str()));
            }
        }
        let documents = self
            .store
            .list(&self.config.bookmarks_collection, &queries)
            .await?;
        Ok(documents.iter().map(BookmarkRecord::from_document).collect())
    }

    /// Resolves the user's album-filtered bookmarks to video records, newest
    /// bookmark first. Lookups batch in chunks of [`VIDEO_LOOKUP_CHUNK`] ids
    /// and the result keeps bookmark order. Ids the lookup cannot resolve
    /// drop out silently; those bookmarks are the orphans.
    pub async fn list_bookmarked_videos(
        &self,
        user_id: &str,
        filter: &AlbumFilter,
    ) -> Result<Vec<VideoRecord>, StoreError> {
        let bookmarks = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[
                    Query::equal("user", user_id),
                    Query::order_desc("$createdAt"),
                ],
            )
            .await?;

        let wanted: IndexSet<String> = bookmarks
            .iter()
            .map(BookmarkRecord::from_document)
            .filter(|bookmark| filter.matches(bookmark.album_id.as_deref()))
            .filter(|bookmark| !bookmark.video_id.is_empty())
            .map(|bookmark| bookmark.video_id)
            .collect();

        let ids: Vec<&str> = wanted.iter().map(String::as_str).collect();
        let mut by_id: HashMap<String, VideoRecord> = HashMap::new();
        for chunk in ids.chunks(VIDEO_LOOKUP_CHUNK) {
            let resolved = self
                .store
                .list(
                    &self.config.videos_collection,
                    &[
                        Query::equal_any("$id", chunk.iter().copied()),
                        Query::limit(chunk.len()),
                    ],
                )
                .await?;
            for document in &resolved {
                by_id.insert(document.id.clone(), VideoRecord::from_document(document));
            }
        }

        Ok(wanted
            .iter()
            .filter_map(|video_id| by_id.remove(video_id))
            .collect())
    }
}
