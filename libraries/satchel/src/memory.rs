//! In-memory store and realtime hub. This is the backend the test suites run
//! against; it mirrors the hosted service's observable behavior (query
//! matching over normalized relations, document grants, change events) and
//! adds a couple of knobs for failure simulation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::DocumentStore;
use crate::document::{Document, Permission, Role, relation_id};
use crate::error::StoreError;
use crate::query::Query;
use crate::realtime::{EventHandler, ListenerKey, Realtime, RealtimeEvent, Subscription};

/// Full store-and-push backend held in process. Cloning is cheap and clones
/// share state, so a test can keep one handle for seeding and hand another to
/// the code under test.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

struct Inner {
    database_id: String,
    collections: Mutex<HashMap<String, IndexMap<String, StoredDocument>>>,
    listeners: Mutex<SlotMap<ListenerKey, Listener>>,
    principal: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    next_seq: AtomicU64,
}

struct StoredDocument {
    document: Document,
    permissions: Vec<Permission>,
    // breaks $createdAt ties, since two creates can share a timestamp under
    // paused test time
    seq: u64,
}

struct Listener {
    channel: String,
    handler: Arc<Mutex<EventHandler>>,
}

enum Mutation {
    Update,
    Delete,
}

impl MemoryBackend {
    pub fn new(database_id: impl Into<String>) -> Self {
        MemoryBackend {
            inner: Arc::new(Inner {
                database_id: database_id.into(),
                collections: Mutex::new(HashMap::new()),
                listeners: Mutex::new(SlotMap::with_key()),
                principal: Mutex::new(None),
                fail_reads: AtomicBool::new(false),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Sets the acting principal for permission checks. `None` models
    /// server-key access, which bypasses document grants; `Some(user)` models
    /// a client session.
    pub fn set_principal(&self, principal: Option<&str>) {
        *self.inner.principal.lock().unwrap() = principal.map(str::to_string);
    }

    /// Makes every list call fail until switched off again, for exercising
    /// read-degradation paths.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Relaxed);
    }

    /// Channel descriptor for document events in a collection.
    pub fn channel(&self, collection: &str) -> String {
        format!(
            "databases.{}.collections.{collection}.documents",
            self.inner.database_id
        )
    }

    /// Fans an event out to every listener whose channel the event names.
    /// Handlers run with the listener table unlocked, so a handler may
    /// subscribe or unsubscribe from inside itself.
    pub fn publish(&self, event: RealtimeEvent) {
        let matched: Vec<_> = {
            let listeners = self.inner.listeners.lock().unwrap();
            listeners
                .values()
                .filter(|listener| {
                    event
                        .channels
                        .iter()
                        .any(|channel| channel == &listener.channel)
                })
                .map(|listener| Arc::clone(&listener.handler))
                .collect()
        };
        for handler in matched {
            let mut handler = handler.lock().unwrap();
            (*handler)(&event);
        }
    }

    fn document_event(&self, collection: &str, document: &Document, action: &str) -> RealtimeEvent {
        let channel = self.channel(collection);
        RealtimeEvent {
            events: vec![format!("{channel}.{}.{action}", document.id)],
            channels: vec![format!("{channel}.{}", document.id), channel],
            timestamp: Utc::now(),
            payload: serde_json::to_value(document).unwrap_or(Value::Null),
        }
    }
}

impl DocumentStore for MemoryBackend {
    async fn list(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>, StoreError> {
        if self.inner.fail_reads.load(Relaxed) {
            return Err(StoreError::Io("induced read failure".to_string()));
        }
        let collections = self.inner.collections.lock().unwrap();
        let mut matched: Vec<&StoredDocument> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|stored| queries.iter().all(|query| matches(stored, query)))
                    .collect()
            })
            .unwrap_or_default();

        let mut limit = None;
        for query in queries {
            match query {
                Query::OrderAsc { attribute } => matched.sort_by(|a, b| compare(a, b, attribute)),
                Query::OrderDesc { attribute } => matched.sort_by(|a, b| compare(b, a, attribute)),
                Query::Limit(count) => limit = Some(*count),
                _ => {}
            }
        }
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched
            .into_iter()
            .map(|stored| stored.document.clone())
            .collect())
    }

    async fn create(
        &self,
        collection: &str,
        data: Value,
        permissions: &[Permission],
    ) -> Result<Document, StoreError> {
        let Value::Object(fields) = data else {
            return Err(StoreError::Validation(
                "document data must be a JSON object".to_string(),
            ));
        };
        let document = Document {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            fields,
        };
        let stored = StoredDocument {
            document: document.clone(),
            permissions: permissions.to_vec(),
            seq: self.inner.next_seq.fetch_add(1, Relaxed),
        };
        {
            let mut collections = self.inner.collections.lock().unwrap();
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(document.id.clone(), stored);
        }
        self.publish(self.document_event(collection, &document, "create"));
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        let Value::Object(changes) = data else {
            return Err(StoreError::Validation(
                "document data must be a JSON object".to_string(),
            ));
        };
        let document = {
            let mut collections = self.inner.collections.lock().unwrap();
            let stored = collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(document_id))
                .ok_or_else(|| not_found(collection, document_id))?;
            let principal = self.inner.principal.lock().unwrap();
            if !grants(stored, principal.as_deref(), Mutation::Update) {
                return Err(StoreError::Permission(format!(
                    "principal {} may not update {collection}/{document_id}",
                    principal.as_deref().unwrap_or("-"),
                )));
            }
            drop(principal);
            for (name, value) in changes {
                stored.document.fields.insert(name, value);
            }
            stored.document.clone()
        };
        self.publish(self.document_event(collection, &document, "update"));
        Ok(document)
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        let document = {
            let mut collections = self.inner.collections.lock().unwrap();
            let documents = collections
                .get_mut(collection)
                .ok_or_else(|| not_found(collection, document_id))?;
            let stored = documents
                .get(document_id)
                .ok_or_else(|| not_found(collection, document_id))?;
            let principal = self.inner.principal.lock().unwrap();
            if !grants(stored, principal.as_deref(), Mutation::Delete) {
                return Err(StoreError::Permission(format!(
                    "principal {} may not delete {collection}/{document_id}",
                    principal.as_deref().unwrap_or("-"),
                )));
            }
            drop(principal);
            // shift_remove keeps the remaining documents in insertion order
            match documents.shift_remove(document_id) {
                Some(stored) => stored.document,
                None => return Err(not_found(collection, document_id)),
            }
        };
        self.publish(self.document_event(collection, &document, "delete"));
        Ok(())
    }
}

impl Realtime for MemoryBackend {
    fn subscribe(&self, channel: &str, handler: EventHandler) -> Subscription {
        let key = self.inner.listeners.lock().unwrap().insert(Listener {
            channel: channel.to_string(),
            handler: Arc::new(Mutex::new(handler)),
        });
        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().unwrap().remove(key);
            }
        })
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn matches(stored: &StoredDocument, query: &Query) -> bool {
    let document = &stored.document;
    match query {
        Query::Equal { attribute, values } => match attribute.as_str() {
            "$id" => values
                .iter()
                .any(|value| value.as_str() == Some(document.id.as_str())),
            _ => {
                let field = document.field(attribute);
                values.iter().any(|wanted| field_equals(field, wanted))
            }
        },
        Query::IsNull { attribute } => field_is_null(document.field(attribute)),
        Query::Search { attribute, terms } => document
            .text(attribute)
            .is_some_and(|text| text.to_lowercase().contains(&terms.to_lowercase())),
        // ordering and limits do not filter
        Query::OrderAsc { .. } | Query::OrderDesc { .. } | Query::Limit(_) => true,
    }
}

/// Equality through relation normalization, so a filter on a relation
/// attribute matches whether the stored value is a bare id or an expanded
/// object.
fn field_equals(field: Option<&Value>, wanted: &Value) -> bool {
    let Some(field) = field else { return false };
    match (relation_id(field), wanted.as_str()) {
        (Some(id), Some(wanted)) => id == wanted,
        _ => field == wanted,
    }
}

fn field_is_null(field: Option<&Value>) -> bool {
    match field {
        None => true,
        Some(Value::Null) => true,
        Some(value @ (Value::String(_) | Value::Object(_))) => relation_id(value).is_none(),
        Some(_) => false,
    }
}

fn compare(a: &StoredDocument, b: &StoredDocument, attribute: &str) -> Ordering {
    let by_attribute = match attribute {
        "$createdAt" => a.document.created_at.cmp(&b.document.created_at),
        "$id" => a.document.id.cmp(&b.document.id),
        _ => a
            .document
            .text(attribute)
            .unwrap_or("")
            .cmp(b.document.text(attribute).unwrap_or("")),
    };
    by_attribute.then(a.seq.cmp(&b.seq))
}

fn grants(stored: &StoredDocument, principal: Option<&str>, mutation: Mutation) -> bool {
    // no principal means server-key access, which bypasses document grants
    let Some(principal) = principal else {
        return true;
    };
    // documents without grants fall back to collection-level rules, which
    // this backend leaves open
    if stored.permissions.is_empty() {
        return true;
    }
    stored.permissions.iter().any(|permission| {
        let role = match (permission, &mutation) {
            (Permission::Update(role), Mutation::Update) => role,
            (Permission::Delete(role), Mutation::Delete) => role,
            _ => return false,
        };
        match role {
            Role::Any => true,
            Role::User(id) => id == principal,
        }
    })
}
