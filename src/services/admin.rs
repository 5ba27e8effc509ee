use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::catalog::available_copies;
use super::fines::{calculate_fine, days_remaining};
use crate::core::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::book_requests::PendingBookRequest;
use crate::models::books::{Book, BookSummary};
use crate::models::borrowed_books::ActiveLoan;
use crate::models::profiles::ProfileResponse;
use crate::models::return_requests::PendingReturnRequest;
use crate::models::stats::{FineRefreshSummary, LibraryStats};
use crate::models::RequestStatus;

async fn books_by_id(store: &dyn LibraryStore) -> Result<HashMap<i32, Book>, AppError> {
    Ok(store
        .list_books()
        .await?
        .into_iter()
        .map(|book| (book.id, book))
        .collect())
}

async fn names_by_id(store: &dyn LibraryStore) -> Result<HashMap<i32, String>, AppError> {
    Ok(store
        .list_profiles()
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile.full_name))
        .collect())
}

/// Dashboard counters. `total_fees` is the live fine of every active loan.
pub async fn library_stats(
    store: &dyn LibraryStore,
    now: DateTime<Utc>,
) -> Result<LibraryStats, AppError> {
    let active_loans = store.list_active_loans().await?;
    let total_fees = active_loans
        .iter()
        .map(|loan| calculate_fine(loan.due_date, Some(now), Some(loan.daily_fine_rate)).total_fine)
        .sum::<Decimal>();

    Ok(LibraryStats {
        total_books: store.count_books().await?,
        total_categories: store.count_categories().await?,
        total_users: store.count_profiles().await?,
        borrowed_count: active_loans.len() as i64,
        total_fees,
    })
}

pub async fn pending_book_requests(
    store: &dyn LibraryStore,
) -> Result<Vec<PendingBookRequest>, AppError> {
    let requests = store
        .list_book_requests_by_status(RequestStatus::Pending)
        .await?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let books = books_by_id(store).await?;
    let names = names_by_id(store).await?;
    let loans = store.active_loan_counts().await?;

    Ok(requests
        .into_iter()
        .map(|request| {
            let book = books.get(&request.book_id);
            let lent_out = loans.get(&request.book_id).copied().unwrap_or(0);
            PendingBookRequest {
                book: book.map(BookSummary::from),
                requester_name: names.get(&request.user_id).cloned(),
                total_copies: book.map(|book| book.total_copies).unwrap_or(0),
                available_copies: book
                    .map(|book| available_copies(book, lent_out))
                    .unwrap_or(0),
                request,
            }
        })
        .collect())
}

pub async fn pending_return_requests(
    store: &dyn LibraryStore,
    now: DateTime<Utc>,
) -> Result<Vec<PendingReturnRequest>, AppError> {
    let requests = store
        .list_return_requests_by_status(RequestStatus::Pending)
        .await?;
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let books = books_by_id(store).await?;
    let names = names_by_id(store).await?;

    let mut pending = Vec::with_capacity(requests.len());
    for request in requests {
        let loan = store.get_borrowed_book(request.borrowed_book_id).await?;
        let book = loan
            .as_ref()
            .and_then(|loan| books.get(&loan.book_id))
            .map(BookSummary::from);
        let is_overdue = loan
            .as_ref()
            .map(|loan| calculate_fine(loan.due_date, Some(now), None).is_overdue)
            .unwrap_or(false);

        pending.push(PendingReturnRequest {
            book,
            requester_name: names.get(&request.user_id).cloned(),
            issue_date: loan.as_ref().map(|loan| loan.issue_date),
            due_date: loan.as_ref().map(|loan| loan.due_date),
            is_overdue,
            request,
        });
    }
    Ok(pending)
}

/// Every open loan, soonest due first, with its live fine.
pub async fn active_loans(
    store: &dyn LibraryStore,
    now: DateTime<Utc>,
) -> Result<Vec<ActiveLoan>, AppError> {
    let loans = store.list_active_loans().await?;
    if loans.is_empty() {
        return Ok(Vec::new());
    }

    let books = books_by_id(store).await?;
    let names = names_by_id(store).await?;

    Ok(loans
        .into_iter()
        .map(|loan| ActiveLoan {
            book: books.get(&loan.book_id).map(BookSummary::from),
            borrower_name: names.get(&loan.user_id).cloned(),
            days_remaining: days_remaining(loan.due_date, now),
            fine: calculate_fine(loan.due_date, Some(now), Some(loan.daily_fine_rate)),
            loan,
        })
        .collect())
}

pub async fn list_users(store: &dyn LibraryStore) -> Result<Vec<ProfileResponse>, AppError> {
    Ok(store
        .list_profiles()
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect())
}

/// Persists the current fine of every overdue active loan.
pub async fn refresh_fines(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    now: DateTime<Utc>,
) -> Result<FineRefreshSummary, AppError> {
    let mut updated = 0;
    for loan in store.list_active_loans().await? {
        let fine = calculate_fine(loan.due_date, Some(now), Some(loan.daily_fine_rate));
        if fine.total_fine <= Decimal::ZERO {
            continue;
        }
        store.update_loan_fine(loan.id, fine.total_fine, now).await?;
        feed.publish(ChangeEvent::new(Table::BorrowedBooks, ChangeKind::Update, loan.id));
        updated += 1;
    }

    tracing::info!(updated, "overdue fines refreshed");
    Ok(FineRefreshSummary { updated })
}
