//! Bookmark and album reconciliation for clipshelf, a mobile video-sharing
//! app. The app itself is a thin UI over a hosted document store; everything
//! that actually has to be *right* lives here:
//!
//! 1. Saving videos as bookmarks, one per user/video pair, optionally filed
//!    into an album ([`bookmarks`]).
//! 2. User-owned albums with per-album counts, where "unassigned" is a real
//!    category and not just missing data ([`albums`]).
//! 3. Detecting and cleaning up bookmarks whose video has been deleted out
//!    from under them ([`orphans`]).
//! 4. Turning server-pushed change events into debounced refresh callbacks
//!    ([`watch`]).
//!
//! All operations take the acting user id explicitly; nothing in here reaches
//! for ambient session state.

pub mod albums;
pub mod bookmarks;
pub mod config;
pub mod model;
pub mod orphans;
pub mod outcome;
pub mod videos;
pub mod watch;

pub use albums::AlbumChanges;
pub use config::StoreConfig;
pub use model::{AlbumFilter, AlbumRecord, BookmarkRecord, UNASSIGNED_KEY, VideoRecord};
pub use orphans::{OrphanScan, find_orphans};
pub use outcome::{BulkFailure, BulkOutcome};
pub use satchel::StoreError;
pub use videos::VideoChanges;
pub use watch::{BOOKMARK_REFRESH_DEBOUNCE, BookmarkWatch, watch_user_bookmarks};

use satchel::{DocumentStore, Permission, Role};

/// Handle over the remote store plus the collection layout, carrying every
/// reconciliation operation as methods. Generic over the store so the same
/// logic runs against the in-memory backend in tests and the REST backend in
/// the doctor binary.
pub struct Shelf<S> {
    store: S,
    config: StoreConfig,
}

impl<S: DocumentStore> Shelf<S> {
    pub fn new(store: S, config: StoreConfig) -> Self {
        Shelf { store, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

/// Grants attached to user-owned rows: anyone may read, only the owner may
/// change or remove. Cross-user rows staying readable is what makes bulk
/// cleanup a soft-failure affair.
pub(crate) fn owner_permissions(user_id: &str) -> [Permission; 3] {
    [
        Permission::Read(Role::Any),
        Permission::Update(Role::User(user_id.to_string())),
        Permission::Delete(Role::User(user_id.to_string())),
    ]
}
