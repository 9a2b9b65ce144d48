//! Orphan bookmark detection and cleanup.
//!
//! A bookmark goes stale when its video is deleted but the bookmark row
//! stays behind (the deletion cascade is best-effort). Staleness is computed
//! at read time by diffing the bookmark view against the videos that
//! actually resolved; nothing is flagged persistently.

use std::collections::HashSet;

use satchel::{DocumentStore, StoreError};

use crate::Shelf;
use crate::model::{AlbumFilter, BookmarkRecord, VideoRecord};
use crate::outcome::BulkOutcome;

/// Bookmarks in `bookmarks` whose video reference resolves to nothing in
/// `videos`. Blank references are skipped, not treated as orphans.
pub fn find_orphans(bookmarks: &[BookmarkRecord], videos: &[VideoRecord]) -> Vec<BookmarkRecord> {
    let resolved: HashSet<&str> = videos.iter().map(|video| video.id.as_str()).collect();
    bookmarks
        .iter()
        .filter(|bookmark| {
            !bookmark.video_id.is_empty() && !resolved.contains(bookmark.video_id.as_str())
        })
        .cloned()
        .collect()
}

/// One orphan sweep over a user's bookmarks under an album filter.
#[derive(Debug)]
pub struct OrphanScan {
    pub orphans: Vec<BookmarkRecord>,
    pub bookmarks_considered: usize,
    pub videos_resolved: usize,
}

impl<S: DocumentStore> Shelf<S> {
    /// Detects orphans in the album-filtered view. The filter narrows the
    /// bookmark set *before* detection, so switching albums changes the
    /// denominator as well as the matches.
    pub async fn scan_orphans(
        &self,
        user_id: &str,
        filter: &AlbumFilter,
    ) -> Result<OrphanScan, StoreError> {
        let bookmarks = self.list_bookmarks_in_album(user_id, filter).await?;
        let videos = self.list_bookmarked_videos(user_id, filter).await?;
        let orphans = find_orphans(&bookmarks, &videos);
        Ok(OrphanScan {
            bookmarks_considered: bookmarks.len(),
            videos_resolved: videos.len(),
            orphans,
        })
    }

    /// Best-effort sequential removal of the given orphans. Rows that refuse
    /// to go (another user's bookmark, already gone) are recorded in the
    /// outcome, not raised.
    pub async fn clean_orphans(&self, orphans: &[BookmarkRecord]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for orphan in orphans {
            match self.delete_bookmark(&orphan.id).await {
                Ok(()) => outcome.record(&orphan.id, Ok(())),
                Err(error) if error.is_not_found() => outcome.record(&orphan.id, Ok(())),
                Err(error) => {
                    log::error!("removing orphan bookmark {} failed: {error}", orphan.id);
                    outcome.record(&orphan.id, Err(error));
                }
            }
        }
        log::info!("orphan cleanup {}", outcome.summary());
        outcome
    }
}
