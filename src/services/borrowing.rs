//! Borrow-request lifecycle: a student asks, an admin approves or declines.
//!
//! Availability is checked by counting active loans right before acting.
//! Two approvals racing for the last copy can both succeed; nothing here
//! pretends otherwise.

use chrono::{DateTime, Utc};

use super::catalog::{available_copies, recompute_book_status};
use super::fines::due_date_from;
use crate::core::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::core::config::LibraryPolicy;
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::book_requests::BookRequest;
use crate::models::borrowed_books::{BorrowedBook, NewBorrowedBook};
use crate::models::RequestStatus;

pub async fn request_book(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    policy: &LibraryPolicy,
    user_id: i32,
    book_id: i32,
    now: DateTime<Utc>,
) -> Result<BookRequest, AppError> {
    let active_loans = store.count_active_loans_for_user(user_id).await?;
    if active_loans >= i64::from(policy.max_active_loans) {
        return Err(AppError::borrow_limit_reached(format!(
            "You can only borrow up to {} books at a time",
            policy.max_active_loans
        )));
    }

    let book = store
        .get_book(book_id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    let lent_out = store.count_active_loans_for_book(book_id).await?;
    if available_copies(&book, lent_out) <= 0 {
        return Err(AppError::no_copies_available(
            "No copies of this book are available right now",
        ));
    }

    let already_pending = store
        .list_book_requests_for_user(user_id)
        .await?
        .iter()
        .any(|request| request.book_id == book_id && request.status == RequestStatus::Pending);
    if already_pending {
        return Err(AppError::conflict(
            "You already have a pending request for this book",
        ));
    }

    let request = store.create_book_request(user_id, book_id, now).await?;
    tracing::info!(request_id = request.id, user_id, book_id, "borrow request created");
    feed.publish(
        ChangeEvent::new(Table::BookRequests, ChangeKind::Insert, request.id)
            .with_status(RequestStatus::Pending),
    );
    Ok(request)
}

async fn pending_book_request(
    store: &dyn LibraryStore,
    request_id: i32,
) -> Result<BookRequest, AppError> {
    let request = store
        .get_book_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Book request not found"))?;
    if request.status.is_terminal() {
        return Err(AppError::conflict(format!(
            "This request has already been {}",
            request.status.as_str().to_lowercase()
        )));
    }
    Ok(request)
}

/// Approves a pending request and opens the loan. `due_date` overrides the
/// configured loan length.
pub async fn approve_request(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    policy: &LibraryPolicy,
    request_id: i32,
    admin_id: i32,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<BorrowedBook, AppError> {
    let mut request = pending_book_request(store, request_id).await?;

    if let Some(due_date) = due_date {
        if due_date < now {
            return Err(AppError::bad_request("Due date cannot be in the past"));
        }
    }

    let book = store
        .get_book(request.book_id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;
    let lent_out = store.count_active_loans_for_book(book.id).await?;
    if available_copies(&book, lent_out) <= 0 {
        tracing::warn!(request_id, book_id = book.id, "approval rejected, no copies left");
        return Err(AppError::no_copies_available(
            "No copies of this book are available to lend",
        ));
    }

    store
        .update_book_request_status(request_id, RequestStatus::Approved, admin_id, now)
        .await?;
    request.status = RequestStatus::Approved;

    let loan = store
        .create_borrowed_book(&NewBorrowedBook {
            user_id: request.user_id,
            book_id: request.book_id,
            request_id: Some(request.id),
            issue_date: now,
            due_date: due_date.unwrap_or_else(|| due_date_from(now, policy.default_loan_days)),
            daily_fine_rate: policy.daily_fine_rate,
        })
        .await?;

    recompute_book_status(store, book.id).await?;

    tracing::info!(
        request_id,
        loan_id = loan.id,
        due_date = %loan.due_date,
        "borrow request approved"
    );
    feed.publish(
        ChangeEvent::new(Table::BookRequests, ChangeKind::Update, request.id)
            .with_status(request.status),
    );
    feed.publish(ChangeEvent::new(Table::BorrowedBooks, ChangeKind::Insert, loan.id));
    feed.publish(ChangeEvent::new(Table::Books, ChangeKind::Update, book.id));
    Ok(loan)
}

pub async fn decline_request(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    request_id: i32,
    admin_id: i32,
    now: DateTime<Utc>,
) -> Result<BookRequest, AppError> {
    let mut request = pending_book_request(store, request_id).await?;

    store
        .update_book_request_status(request_id, RequestStatus::Declined, admin_id, now)
        .await?;
    request.status = RequestStatus::Declined;
    request.reviewed_by = Some(admin_id);
    request.reviewed_at = Some(now);

    tracing::info!(request_id, "borrow request declined");
    feed.publish(
        ChangeEvent::new(Table::BookRequests, ChangeKind::Update, request.id)
            .with_status(request.status),
    );
    Ok(request)
}
