//! Unread counter for the admin dashboard.
//!
//! The counter is only a nudge: whoever reads it also re-fetches the pending
//! queues from the store, so a missed event never hides a request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::admin::{pending_book_requests, pending_return_requests};
use crate::core::change_feed::{ChangeCallback, ChangeEvent, ChangeFeed, ChangeKind, Subscription, Table};
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::stats::NotificationSummary;
use crate::models::RequestStatus;

const LATEST_LIMIT: usize = 5;

pub struct AdminNotifications {
    unread: Arc<AtomicU64>,
    _subscriptions: Vec<Subscription>,
}

impl AdminNotifications {
    /// Starts counting new pending borrow and return requests published on `feed`.
    pub fn subscribe(feed: &dyn ChangeFeed) -> Self {
        let unread = Arc::new(AtomicU64::new(0));

        let subscriptions = [Table::BookRequests, Table::ReturnRequests]
            .into_iter()
            .map(|table| feed.on_change(table, counter(unread.clone())))
            .collect();

        Self {
            unread,
            _subscriptions: subscriptions,
        }
    }

    pub fn unread(&self) -> u64 {
        self.unread.load(Ordering::SeqCst)
    }

    /// Returns the count that was cleared.
    pub fn mark_read(&self) -> u64 {
        self.unread.swap(0, Ordering::SeqCst)
    }
}

fn counter(unread: Arc<AtomicU64>) -> ChangeCallback {
    Arc::new(move |event: &ChangeEvent| {
        if event.kind == ChangeKind::Insert && event.status == Some(RequestStatus::Pending) {
            let total = unread.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(
                table = event.table.as_str(),
                row_id = event.row_id,
                unread = total,
                "new request awaiting review"
            );
        }
    })
}

/// Unread count plus a fresh pull of both pending queues.
pub async fn notification_summary(
    store: &dyn LibraryStore,
    notifications: &AdminNotifications,
    now: DateTime<Utc>,
) -> Result<NotificationSummary, AppError> {
    let book_requests = pending_book_requests(store).await?;
    let return_requests = pending_return_requests(store, now).await?;

    Ok(NotificationSummary {
        unread: notifications.unread(),
        pending_book_requests: book_requests.len(),
        pending_return_requests: return_requests.len(),
        latest_book_requests: book_requests.into_iter().take(LATEST_LIMIT).collect(),
        latest_return_requests: return_requests.into_iter().take(LATEST_LIMIT).collect(),
    })
}
