//! Change notification bridge: server-pushed bookmark events in, one
//! debounced refresh callback out.
//!
//! The app refetches its bookmark views whenever the user's rows change on
//! the server. Bulk flows (orphan cleanup, album deletion) land as a burst
//! of events in quick succession; one refetch after the burst is enough, so
//! matching events re-arm a trailing debounce timer instead of firing
//! directly. The timer is a spawned task, which means events must be
//! delivered on a tokio runtime.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use satchel::{Realtime, Subscription, relation_id};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::StoreConfig;

/// How long to sit on a burst of change events before refreshing.
pub const BOOKMARK_REFRESH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Single-slot trailing-edge timer. Arming replaces (and cancels) whatever
/// was pending, so only the last arm within a window fires. Closing the
/// slot aborts the pending run and refuses every later arm.
#[derive(Clone, Default)]
pub(crate) struct DebounceSlot {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    pending: Option<JoinHandle<()>>,
    closed: bool,
}

impl DebounceSlot {
    pub(crate) fn arm(&self, delay: Duration, job: Arc<dyn Fn() + Send + Sync>) {
        let mut slot = self.slot.lock().unwrap();
        if slot.closed {
            return;
        }
        if let Some(armed) = slot.pending.take() {
            armed.abort();
        }
        slot.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            job();
        }));
    }

    pub(crate) fn close(&self) {
        let mut slot = self.slot.lock().unwrap();
        slot.closed = true;
        if let Some(armed) = slot.pending.take() {
            armed.abort();
        }
    }
}

/// Live watch over one user's bookmark changes. Tearing it down cancels any
/// pending debounce timer along with the subscription, so a stale refresh
/// callback never fires into a consumer that is already gone.
pub struct BookmarkWatch {
    subscription: Subscription,
    timer: DebounceSlot,
}

impl BookmarkWatch {
    /// A watch that was never wired up; every operation on it is a no-op.
    pub fn inert() -> Self {
        BookmarkWatch {
            subscription: Subscription::noop(),
            timer: DebounceSlot::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Idempotent teardown: safe to call twice, safe on an inert watch.
    pub fn unsubscribe(&mut self) {
        // listener gone first, slot closed second; a delivery caught
        // mid-teardown can at worst arm a timer the close then kills
        self.subscription.unsubscribe();
        self.timer.close();
    }
}

impl Drop for BookmarkWatch {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Starts watching a user's bookmark changes, invoking `on_change` once per
/// quiet [`BOOKMARK_REFRESH_DEBOUNCE`] window. Events for other users and
/// events that do not touch documents are ignored. A blank `user_id` yields
/// an inert watch.
pub fn watch_user_bookmarks<R: Realtime>(
    realtime: &R,
    config: &StoreConfig,
    user_id: &str,
    on_change: impl Fn() + Send + Sync + 'static,
) -> BookmarkWatch {
    let user_id = user_id.trim().to_string();
    if user_id.is_empty() {
        return BookmarkWatch::inert();
    }

    let timer = DebounceSlot::default();
    let armed = timer.clone();
    let job: Arc<dyn Fn() + Send + Sync> = Arc::new(on_change);
    let subscription = realtime.subscribe(
        &config.bookmark_channel(),
        Box::new(move |event| {
            if !event.touches_documents() {
                return;
            }
            if event.payload.get("user").and_then(relation_id) != Some(user_id.as_str()) {
                return;
            }
            armed.arm(BOOKMARK_REFRESH_DEBOUNCE, Arc::clone(&job));
        }),
    );

    BookmarkWatch {
        subscription,
        timer,
    }
}
