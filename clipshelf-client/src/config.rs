//! Collection layout configuration.

use std::env;

use thiserror::Error;

/// Where the app's collections live in the hosted database. Collection ids
/// come from the provider console, so deployments supply them through the
/// environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_id: String,
    pub videos_collection: String,
    pub bookmarks_collection: String,
    pub albums_collection: String,
}

#[derive(Debug, Error)]
#[error("missing environment variable {0}")]
pub struct MissingEnv(pub &'static str);

impl StoreConfig {
    pub fn from_env() -> Result<Self, MissingEnv> {
        Ok(StoreConfig {
            database_id: required("CLIPSHELF_DATABASE_ID")?,
            videos_collection: required("CLIPSHELF_VIDEOS_COLLECTION")?,
            bookmarks_collection: required("CLIPSHELF_BOOKMARKS_COLLECTION")?,
            albums_collection: required("CLIPSHELF_ALBUMS_COLLECTION")?,
        })
    }

    /// Channel descriptor for document events in the bookmark collection.
    pub fn bookmark_channel(&self) -> String {
        format!(
            "databases.{}.collections.{}.documents",
            self.database_id, self.bookmarks_collection
        )
    }
}

fn required(name: &'static str) -> Result<String, MissingEnv> {
    env::var(name).map_err(|_| MissingEnv(name))
}
