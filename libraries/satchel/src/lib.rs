//! This is a client library for a hosted document database with realtime push,
//! of the kind backend-as-a-service providers expose. It was created for
//! clipshelf, so it doesn't include much that was not needed for that project.
//!
//! The moving parts:
//! 1. Documents live in named collections. Every document carries a
//!    store-assigned id and creation timestamp alongside its own attributes.
//! 2. Reads go through [`Query`] values (equality, null checks, search,
//!    ordering, limits) that encode to the provider's wire format.
//! 3. Mutations can attach [`Permission`]s so rows stay readable across users
//!    while only their owner may change them.
//! 4. Server-pushed change events arrive on channels; [`Realtime`] hands out
//!    cancellable [`Subscription`]s.
//!
//! [`memory::MemoryBackend`] implements the whole surface in process (it is
//! what the test suites run against); the `rest` feature adds an HTTP backend
//! for the hosted service.

pub mod document;
pub mod error;
pub mod memory;
pub mod query;
pub mod realtime;

#[cfg(feature = "rest")]
pub mod rest;

pub use document::{Document, Permission, Role, relation_id};
pub use error::StoreError;
pub use query::Query;
pub use realtime::{EventHandler, ListenerKey, Realtime, RealtimeEvent, Subscription};

use serde_json::Value;

/// Storage collaborator: collections of schemaless documents with simple
/// filtered reads. Document ids are assigned by the store on create.
pub trait DocumentStore {
    async fn list(&self, collection: &str, queries: &[Query])
    -> Result<Vec<Document>, StoreError>;

    async fn create(
        &self,
        collection: &str,
        data: Value,
        permissions: &[Permission],
    ) -> Result<Document, StoreError>;

    async fn update(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError>;

    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), StoreError>;
}
