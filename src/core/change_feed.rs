//! Row-change notifications.
//!
//! Writers publish a [`ChangeEvent`] after a mutation lands; readers register
//! a callback per table and re-fetch what they need. Delivery is in-process
//! and best effort: no buffering, no replay for late subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::models::RequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Books,
    Categories,
    Profiles,
    BookRequests,
    BorrowedBooks,
    ReturnRequests,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Books => "books",
            Table::Categories => "categories",
            Table::Profiles => "profiles",
            Table::BookRequests => "book_requests",
            Table::BorrowedBooks => "borrowed_books",
            Table::ReturnRequests => "return_requests",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: i32,
    /// Request status after the change, for the request tables.
    pub status: Option<RequestStatus>,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, row_id: i32) -> Self {
        Self {
            table,
            kind,
            row_id,
            status: None,
        }
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }
}

pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

pub trait ChangeFeed: Send + Sync {
    fn on_change(&self, table: Table, callback: ChangeCallback) -> Subscription;

    fn publish(&self, event: ChangeEvent);
}

/// Handle returned by [`ChangeFeed::on_change`]. Dropping it also unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<u64, (Table, ChangeCallback)>,
}

#[derive(Clone, Default)]
pub struct InProcessChangeFeed {
    registry: Arc<Mutex<Registry>>,
}

impl InProcessChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChangeFeed for InProcessChangeFeed {
    fn on_change(&self, table: Table, callback: ChangeCallback) -> Subscription {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, (table, callback));
            id
        };

        let registry = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).listeners.remove(&id);
            }
        })
    }

    fn publish(&self, event: ChangeEvent) {
        // Callbacks run outside the lock so they may subscribe or publish themselves.
        let callbacks: Vec<ChangeCallback> = lock(&self.registry)
            .listeners
            .values()
            .filter(|(table, _)| *table == event.table)
            .map(|(_, callback)| callback.clone())
            .collect();

        tracing::debug!(
            table = event.table.as_str(),
            row_id = event.row_id,
            listeners = callbacks.len(),
            "publishing change event"
        );

        for callback in callbacks {
            callback(&event);
        }
    }
}
