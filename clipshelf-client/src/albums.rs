//! Album registry: user-owned groupings of bookmarks with count aggregation.

use indexmap::IndexMap;
use satchel::{DocumentStore, Query, StoreError};
use serde_json::{Value, json};

use crate::model::{AlbumRecord, BookmarkRecord, UNASSIGNED_KEY, normalize_album};
use crate::outcome::BulkOutcome;
use crate::{Shelf, owner_permissions};

/// Partial album update; `None` leaves a field alone.
#[derive(Debug, Default)]
pub struct AlbumChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl<S: DocumentStore> Shelf<S> {
    pub async fn create_album(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<AlbumRecord, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "album name must not be empty".to_string(),
            ));
        }
        let description = description.map(str::trim).filter(|text| !text.is_empty());
        let document = self
            .store
            .create(
                &self.config.albums_collection,
                json!({
                    "name": name,
                    "description": description,
                    "user": user_id,
                    "isDefault": false,
                }),
                &owner_permissions(user_id),
            )
            .await?;
        Ok(AlbumRecord::from_document(&document))
    }

    /// A user's albums, oldest first. Degrades to empty on read failure.
    pub async fn list_albums(&self, user_id: &str) -> Vec<AlbumRecord> {
        let listed = self
            .store
            .list(
                &self.config.albums_collection,
                &[
                    Query::equal("user", user_id),
                    Query::order_asc("$createdAt"),
                ],
            )
            .await;
        match listed {
            Ok(documents) => documents.iter().map(AlbumRecord::from_document).collect(),
            Err(error) => {
                log::warn!("listing albums for {user_id} failed: {error}");
                Vec::new()
            }
        }
    }

    /// Renames or re-describes an album. Name stays required; a `Some("")`
    /// description clears it.
    pub async fn update_album(
        &self,
        album_id: &str,
        changes: &AlbumChanges,
    ) -> Result<AlbumRecord, StoreError> {
        let mut data = serde_json::Map::new();
        if let Some(name) = &changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::Validation(
                    "album name must not be empty".to_string(),
                ));
            }
            data.insert("name".to_string(), Value::String(name.to_string()));
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
            .update(&self.config.albums_collection, album_id, Value::Object(data))
            .await?;
        Ok(AlbumRecord::from_document(&document))
    }

    /// Deletes an album without deleting its bookmarks: every bookmark filed
    /// in the album is unassigned first, then the album document goes away.
    /// The whole unassign phase is best-effort. Rows that refuse to unassign
    /// (another user's bookmark, vanished row), and even a failure to list
    /// them at all, are logged and never abort the deletion; affected rows
    /// keep a dangling reference until orphan-style cleanup catches them.
    pub async fn delete_album(&self, album_id: &str) -> Result<BulkOutcome, StoreError> {
        let listed = self
            .store
            .list(
                &self.config.bookmarks_collection,
                &[Query::equal("album", album_id)],
            )
            .await;
        let filed = match listed {
            Ok(documents) => documents,
            Err(error) => {
                log::warn!("listing bookmarks in album {album_id} failed: {error}");
                Vec::new()
            }
        };

        let mut outcome = BulkOutcome::default();
        for document in &filed {
            let unassigned = self
                .store
                .update(
                    &self.config.bookmarks_collection,
                    &document.id,
                    json!({ "album": null }),
                )
                .await;
            match unassigned {
                Ok(_) => outcome.record(&document.id, Ok(())),
                Err(error) if error.is_not_found() => outcome.record(&document.id, Ok(())),
                Err(error) => {
                    log::error!(
                        "unassigning bookmark {} from album {album_id} failed: {error}",
                        document.id
                    );
                    outcome.record(&document.id, Err(error));
                }
            }
        }

        self.store
            .delete(&self.config.albums_collection, album_id)
            .await?;
        Ok(outcome)
    }

    /// Tallies the user's bookmarks by album reference, with the reserved
    /// [`UNASSIGNED_KEY`] bucket for bookmarks that have no album. Full scan
    /// per call, which is fine at per-user bookmark volumes; degrades to an
    /// empty map on read failure.
    pub async fn count_bookmarks_per_album(&self, user_id: &str) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for bookmark in self.list_raw_bookmarks(user_id).await {
            let key = bookmark
                .album_id
                .as_deref()
                .unwrap_or(UNASSIGNED_KEY)
                .to_string();
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// Refiles one bookmark (`None` unassigns). Unlike the bulk flows this
    /// is a direct user edit, so a vanished or foreign row is a hard error.
    pub async fn move_bookmark_to_album(
        &self,
        bookmark_id: &str,
        album_id: Option<&str>,
    ) -> Result<BookmarkRecord, StoreError> {
        let album_id = normalize_album(album_id);
        let document = self
            .store
            .update(
                &self.config.bookmarks_collection,
                bookmark_id,
                json!({ "album": album_id }),
            )
            .await?;
        Ok(BookmarkRecord::from_document(&document))
    }
}
