use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

slotmap::new_key_type! {
    /// Key identifying one registered realtime listener.
    pub struct ListenerKey;
}

/// One server-pushed change notification. `events` are dotted action strings
/// ending in the mutation kind (`...documents.{id}.create` and so on),
/// `channels` are the subscription channels the event was fanned out to, and
/// `payload` is the document after the mutation (for deletes, the removed
/// document).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub events: Vec<String>,
    pub channels: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl RealtimeEvent {
    /// Whether any action string concerns documents (as opposed to collection
    /// or attribute lifecycle events on the same channel).
    pub fn touches_documents(&self) -> bool {
        self.events.iter().any(|event| event.contains(".documents."))
    }
}

pub type EventHandler = Box<dyn FnMut(&RealtimeEvent) + Send + 'static>;

/// Push-change collaborator. Implementations deliver every event published on
/// a channel to the handlers subscribed to it, in subscription order.
pub trait Realtime {
    fn subscribe(&self, channel: &str, handler: EventHandler) -> Subscription;
}

/// Handle for one subscription. Unsubscribing is idempotent, and dropping the
/// handle unsubscribes, so a forgotten handle cannot leak a listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never established; unsubscribing it does
    /// nothing.
    pub fn noop() -> Self {
        Subscription { cancel: None }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
