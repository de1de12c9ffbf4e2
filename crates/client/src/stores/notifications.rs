//! Local notification feed.
//!
//! Nothing here touches the network. Entries arrive from local actions or
//! the realtime adapter, newest first, and the feed keeps at most
//! `capacity` of them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use shopfront_core::{NewNotification, Notification};
use tracing::debug;
use uuid::Uuid;

/// Notification feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    /// Newest first.
    pub items: Vec<Notification>,
    pub unread: usize,
}

impl NotificationState {
    fn decrement_if_unread(&mut self, was_read: bool) {
        if !was_read {
            self.unread = self.unread.saturating_sub(1);
        }
    }
}

/// Notification feed store.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<NotificationStoreInner>,
}

struct NotificationStoreInner {
    capacity: usize,
    state: Mutex<NotificationState>,
}

impl NotificationStore {
    /// Create an empty feed holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(NotificationStoreInner {
                capacity: capacity.max(1),
                state: Mutex::new(NotificationState::default()),
            }),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[must_use]
    pub fn snapshot(&self) -> NotificationState {
        self.lock().clone()
    }

    #[must_use]
    pub fn unread(&self) -> usize {
        self.lock().unread
    }

    /// Prepend an unread entry and return its id.
    ///
    /// When the feed is full the oldest entries are evicted; evicted unread
    /// entries no longer count as unread.
    pub fn push(&self, new: NewNotification) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.lock();
        state.items.insert(
            0,
            Notification {
                id,
                kind: new.kind,
                title: new.title,
                message: new.message,
                read: false,
                timestamp: Utc::now(),
            },
        );
        state.unread += 1;

        while state.items.len() > self.inner.capacity {
            if let Some(evicted) = state.items.pop() {
                state.decrement_if_unread(evicted.read);
                debug!(id = %evicted.id, "Evicted oldest notification");
            }
        }
        id
    }

    /// Mark one entry read. Repeated calls decrement the counter once.
    pub fn mark_read(&self, id: Uuid) {
        let mut state = self.lock();
        let Some(item) = state.items.iter_mut().find(|n| n.id == id) else {
            return;
        };
        let was_read = std::mem::replace(&mut item.read, true);
        state.decrement_if_unread(was_read);
    }

    pub fn mark_all_read(&self) {
        let mut state = self.lock();
        for item in &mut state.items {
            item.read = true;
        }
        state.unread = 0;
    }

    /// Remove one entry.
    pub fn dismiss(&self, id: Uuid) {
        let mut state = self.lock();
        if let Some(pos) = state.items.iter().position(|n| n.id == id) {
            let removed = state.items.remove(pos);
            state.decrement_if_unread(removed.read);
        }
    }

    pub fn clear_all(&self) {
        *self.lock() = NotificationState::default();
    }

    fn lock(&self) -> MutexGuard<'_, NotificationState> {
        // The feed holds no invariants a panicking writer could break halfway.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
