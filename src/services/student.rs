use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::fines::{calculate_fine, days_remaining};
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::book_requests::StudentBookRequest;
use crate::models::books::BookSummary;
use crate::models::borrowed_books::ActiveLoan;
use crate::models::return_requests::StudentReturnRequest;

async fn summaries(store: &dyn LibraryStore) -> Result<HashMap<i32, BookSummary>, AppError> {
    Ok(store
        .list_books()
        .await?
        .iter()
        .map(|book| (book.id, BookSummary::from(book)))
        .collect())
}

pub async fn my_book_requests(
    store: &dyn LibraryStore,
    user_id: i32,
) -> Result<Vec<StudentBookRequest>, AppError> {
    let requests = store.list_book_requests_for_user(user_id).await?;
    let books = summaries(store).await?;

    Ok(requests
        .into_iter()
        .map(|request| StudentBookRequest {
            book: books.get(&request.book_id).cloned(),
            request,
        })
        .collect())
}

pub async fn my_active_loans(
    store: &dyn LibraryStore,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<Vec<ActiveLoan>, AppError> {
    let loans = store.list_active_loans_for_user(user_id).await?;
    let books = summaries(store).await?;
    let borrower_name = store
        .get_profile(user_id)
        .await?
        .map(|profile| profile.full_name);

    Ok(loans
        .into_iter()
        .map(|loan| ActiveLoan {
            book: books.get(&loan.book_id).cloned(),
            borrower_name: borrower_name.clone(),
            days_remaining: days_remaining(loan.due_date, now),
            fine: calculate_fine(loan.due_date, Some(now), Some(loan.daily_fine_rate)),
            loan,
        })
        .collect())
}

pub async fn my_return_requests(
    store: &dyn LibraryStore,
    user_id: i32,
) -> Result<Vec<StudentReturnRequest>, AppError> {
    let requests = store.list_return_requests_for_user(user_id).await?;
    let books = summaries(store).await?;

    let mut entries = Vec::with_capacity(requests.len());
    for request in requests {
        let book = store
            .get_borrowed_book(request.borrowed_book_id)
            .await?
            .and_then(|loan| books.get(&loan.book_id).cloned());
        entries.push(StudentReturnRequest { request, book });
    }
    Ok(entries)
}
