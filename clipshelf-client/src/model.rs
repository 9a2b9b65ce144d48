//! Typed projections of the remote documents, plus the album filter that
//! drives every bookmark view.

use chrono::{DateTime, Utc};
use satchel::Document;
use serde::Serialize;
use serde_json::Value;

/// Reserved count key for bookmarks with no album.
pub const UNASSIGNED_KEY: &str = "unassigned";

/// A user's saved reference to a video, optionally filed under an album.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkRecord {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub album_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookmarkRecord {
    /// Projects a store document. Relation attributes arrive either as plain
    /// ids or as expanded objects; both normalize here, so nothing downstream
    /// branches on representation.
    pub fn from_document(document: &Document) -> Self {
        BookmarkRecord {
            id: document.id.clone(),
            user_id: document.relation("user").unwrap_or_default().to_string(),
            video_id: document.relation("video").unwrap_or_default().to_string(),
            album_id: document.relation("album").map(str::to_string),
            created_at: document.created_at,
        }
    }
}

/// A user-defined grouping of bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl AlbumRecord {
    pub fn from_document(document: &Document) -> Self {
        AlbumRecord {
            id: document.id.clone(),
            user_id: document.relation("user").unwrap_or_default().to_string(),
            name: document.text("name").unwrap_or_default().to_string(),
            description: text_field(document, "description"),
            is_default: document
                .field("isDefault")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            created_at: document.created_at,
        }
    }
}

/// The projection of a video document this module needs for display, search
/// and bookmark resolution. Videos are created and owned elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub media_url: Option<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn from_document(document: &Document) -> Self {
        VideoRecord {
            id: document.id.clone(),
            title: document.text("title").unwrap_or_default().to_string(),
            description: text_field(document, "description"),
            thumbnail_url: text_field(document, "thumbnail"),
            media_url: text_field(document, "video"),
            creator_id: document.relation("creator").unwrap_or_default().to_string(),
            created_at: document.created_at,
        }
    }
}

fn text_field(document: &Document, name: &str) -> Option<String> {
    document
        .text(name)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Which bookmarks a view shows. The hosted SDK phrases this as
/// `undefined | null | string`; spelled out here so call sites read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumFilter {
    /// Every bookmark the user owns.
    All,
    /// Only bookmarks not filed in any album.
    Unassigned,
    /// Only bookmarks filed in the given album.
    Album(String),
}

impl AlbumFilter {
    pub fn matches(&self, album_id: Option<&str>) -> bool {
        match self {
            AlbumFilter::All => true,
            AlbumFilter::Unassigned => album_id.is_none(),
            AlbumFilter::Album(id) => album_id == Some(id.as_str()),
        }
    }
}

/// Collapses blank album references to "no album". Callers hand through
/// whatever the UI held, which may be an empty or whitespace-only string.
pub(crate) fn normalize_album(album_id: Option<&str>) -> Option<&str> {
    album_id.map(str::trim).filter(|album| !album.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn album_filter_matches() {
        assert!(AlbumFilter::All.matches(None));
        assert!(AlbumFilter::All.matches(Some("a1")));
        assert!(AlbumFilter::Unassigned.matches(None));
        assert!(!AlbumFilter::Unassigned.matches(Some("a1")));
        assert!(AlbumFilter::Album("a1".to_string()).matches(Some("a1")));
        assert!(!AlbumFilter::Album("a1".to_string()).matches(Some("a2")));
        assert!(!AlbumFilter::Album("a1".to_string()).matches(None));
    }

    #[test]
    fn blank_albums_normalize_to_none() {
        assert_eq!(normalize_album(None), None);
        assert_eq!(normalize_album(Some("")), None);
        assert_eq!(normalize_album(Some("   ")), None);
        assert_eq!(normalize_album(Some(" a1 ")), Some("a1"));
    }

    #[test]
    fn bookmark_projection_normalizes_relations() {
        let document: Document = serde_json::from_value(json!({
            "$id": "b1",
            "$createdAt": "2025-06-01T12:00:00Z",
            "user": { "$id": "u1", "username": "ada" },
            "video": "v1",
            "album": "",
        }))
        .unwrap();

        let bookmark = BookmarkRecord::from_document(&document);
        assert_eq!(bookmark.user_id, "u1");
        assert_eq!(bookmark.video_id, "v1");
        assert_eq!(bookmark.album_id, None);
    }

    #[test]
    fn video_projection_drops_empty_fields() {
        let document: Document = serde_json::from_value(json!({
            "$id": "v1",
            "$createdAt": "2025-06-01T12:00:00Z",
            "title": "Desert Cats",
            "description": "",
            "video": "https://cdn.example/v1.mp4",
            "creator": { "$id": "u1" },
        }))
        .unwrap();

        let video = VideoRecord::from_document(&document);
        assert_eq!(video.title, "Desert Cats");
        assert_eq!(video.description, None);
        assert_eq!(video.thumbnail_url, None);
        assert_eq!(video.media_url.as_deref(), Some("https://cdn.example/v1.mp4"));
        assert_eq!(video.creator_id, "u1");
    }
}
