//! Video catalog access and the deletion cascade. Videos are produced by
//! the upload flow elsewhere; this module reads them, edits their text
//! fields, and tears down bookmark rows when one goes away.

use satchel::{DocumentStore, Query, StoreError};
use serde_json::Value;

use crate::Shelf;
use crate::model::VideoRecord;
use crate::outcome::BulkOutcome;

/// Partial video edit; `None` leaves a field alone.
#[derive(Debug, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl<S: DocumentStore> Shelf<S> {
    /// The whole catalog, newest first.
    pub async fn list_all_videos(&self) -> Result<Vec<VideoRecord>, StoreError> {
        self.videos(&[Query::order_desc("$createdAt")]).await
    }

    /// The `limit` most recent uploads, for the home feed rail.
    pub async fn list_latest_videos(&self, limit: usize) -> Result<Vec<VideoRecord>, StoreError> {
        self.videos(&[Query::order_desc("$createdAt"), Query::limit(limit)])
            .await
    }

    /// Title search: server-side full-text first, falling back to a
    /// client-side substring scan.
    pub async fn search_videos(&self, terms: &str) -> Result<Vec<VideoRecord>, StoreError> {
        let terms = terms.trim();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        // full-text search wants an index the deployment may not carry; an
        // error or an empty page falls back to scanning the catalog
        match self.videos(&[Query::search("title", terms)]).await {
            Ok(found) if !found.is_empty() => Ok(found),
            _ => {
                let needle = terms.to_lowercase();
                let all = self.list_all_videos().await?;
                Ok(all
                    .into_iter()
                    .filter(|video| video.title.to_lowercase().contains(&needle))
                    .collect())
            }
        }
    }

    /// One creator's uploads, newest first.
    pub async fn list_user_videos(&self, user_id: &str) -> Result<Vec<VideoRecord>, StoreError> {
        self.videos(&[
            Query::equal("creator", user_id),
            Query::order_desc("$createdAt"),
        ])
        .await
    }

    /// Edits a video's text fields. Title stays required; a `Some("")`
    /// description clears it.
    pub async fn update_video(
        &self,
        video_id: &str,
        changes: &VideoChanges,
    ) -> Result<VideoRecord, StoreError> {
        let mut data = serde_json::Map::new();
        if let Some(title) = &changes.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(StoreError::Validation(
                    "video title must not be empty".to_string(),
                ));
            }
            data.insert("title".to_string(), Value::String(title.to_string()));
        }
        if let Some(description) = &changes.description {
            let description = description.trim();
            data.insert(
                "description".to_string(),
                if description.is_empty() {
                    Value::Null
                } else {
                    Value::String(description.to_string())
                },
            );
        }
        let document = self
            .store
            .update(&self.config.videos_collection, video_id, Value::Object(data))
            .await?;
        Ok(VideoRecord::from_document(&document))
    }

    /// Deletes a video, then sweeps every user's bookmark of it. The sweep
    /// is best-effort; whatever it cannot remove surfaces later as orphans.
    pub async fn delete_video(&self, video_id: &str) -> Result<BulkOutcome, StoreError> {
        self.store
            .delete(&self.config.videos_collection, video_id)
            .await?;
        self.delete_all_bookmarks_for_video(video_id).await
    }

    async fn videos(&self, queries: &[Query]) -> Result<Vec<VideoRecord>, StoreError> {
        let documents = self
            .store
            .list(&self.config.videos_collection, queries)
            .await?;
        Ok(documents.iter().map(VideoRecord::from_document).collect())
    }
}
