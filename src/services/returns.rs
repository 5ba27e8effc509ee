use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::catalog::recompute_book_status;
use super::fines::calculate_fine;
use crate::core::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::borrowed_books::ReturnSettlement;
use crate::models::return_requests::{ReturnApproval, ReturnRequest};
use crate::models::RequestStatus;

pub async fn request_return(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    user_id: i32,
    borrowed_book_id: i32,
    now: DateTime<Utc>,
) -> Result<ReturnRequest, AppError> {
    let loan = store
        .get_borrowed_book(borrowed_book_id)
        .await?
        .filter(|loan| loan.user_id == user_id)
        .ok_or_else(|| AppError::not_found("Borrowed book not found"))?;

    if !loan.is_active() {
        return Err(AppError::conflict("This book has already been returned"));
    }
    if store
        .find_pending_return_request(loan.id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "A return request for this book is already pending",
        ));
    }

    let request = store.create_return_request(loan.id, user_id, now).await?;
    tracing::info!(request_id = request.id, loan_id = loan.id, "return request created");
    feed.publish(
        ChangeEvent::new(Table::ReturnRequests, ChangeKind::Insert, request.id)
            .with_status(RequestStatus::Pending),
    );
    Ok(request)
}

async fn pending_return_request(
    store: &dyn LibraryStore,
    request_id: i32,
) -> Result<ReturnRequest, AppError> {
    let request = store
        .get_return_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Return request not found"))?;
    if request.status.is_terminal() {
        return Err(AppError::conflict(format!(
            "This return request has already been {}",
            request.status.as_str().to_lowercase()
        )));
    }
    Ok(request)
}

/// Closes the loan and freezes its fine as of `now`.
pub async fn approve_return(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    request_id: i32,
    admin_id: i32,
    now: DateTime<Utc>,
) -> Result<ReturnApproval, AppError> {
    let mut request = pending_return_request(store, request_id).await?;

    let loan = store
        .get_borrowed_book(request.borrowed_book_id)
        .await?
        .ok_or_else(|| AppError::not_found("Borrowed book not found"))?;
    if !loan.is_active() {
        return Err(AppError::conflict("This book has already been returned"));
    }

    let fine = calculate_fine(loan.due_date, Some(now), Some(loan.daily_fine_rate));
    let settlement = ReturnSettlement {
        return_date: now,
        total_fine: fine.total_fine,
        fee_paid: fine.total_fine == Decimal::ZERO,
    };
    store.settle_loan(loan.id, &settlement).await?;
    store
        .update_return_request_status(request_id, RequestStatus::Approved, admin_id, now)
        .await?;
    request.status = RequestStatus::Approved;
    request.processed_by = Some(admin_id);
    request.processed_at = Some(now);

    recompute_book_status(store, loan.book_id).await?;

    tracing::info!(
        request_id,
        loan_id = loan.id,
        days_overdue = fine.days_overdue,
        fine = %fine.total_fine,
        "return approved"
    );
    feed.publish(
        ChangeEvent::new(Table::ReturnRequests, ChangeKind::Update, request.id)
            .with_status(request.status),
    );
    feed.publish(ChangeEvent::new(Table::BorrowedBooks, ChangeKind::Update, loan.id));
    feed.publish(ChangeEvent::new(Table::Books, ChangeKind::Update, loan.book_id));

    Ok(ReturnApproval {
        request,
        fine_charged: fine.total_fine,
        days_overdue: fine.days_overdue,
    })
}

pub async fn decline_return(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    request_id: i32,
    admin_id: i32,
    now: DateTime<Utc>,
) -> Result<ReturnRequest, AppError> {
    let mut request = pending_return_request(store, request_id).await?;

    store
        .update_return_request_status(request_id, RequestStatus::Declined, admin_id, now)
        .await?;
    request.status = RequestStatus::Declined;
    request.processed_by = Some(admin_id);
    request.processed_at = Some(now);

    tracing::info!(request_id, "return request declined");
    feed.publish(
        ChangeEvent::new(Table::ReturnRequests, ChangeKind::Update, request.id)
            .with_status(request.status),
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change_feed::InProcessChangeFeed;
    use crate::core::AppErrorType;
    use crate::db::MemoryLibraryStore;
    use crate::models::books::{BookPayload, BookStatus};
    use crate::models::borrowed_books::NewBorrowedBook;
    use chrono::{Duration, TimeZone};

    async fn loaned_book(store: &MemoryLibraryStore, user_id: i32, due: DateTime<Utc>) -> (i32, i32) {
        let category = store.create_category("Reference").await.unwrap();
        let book = store
            .create_book(
                &BookPayload {
                    title: "Oxford Atlas".to_string(),
                    author: "Various".to_string(),
                    isbn: "9780199666010".to_string(),
                    category_id: category.id,
                    cover_image: None,
                    total_copies: 1,
                },
                due - Duration::days(14),
            )
            .await
            .unwrap();
        store
            .set_book_status(book.id, BookStatus::Unavailable)
            .await
            .unwrap();
        let loan = store
            .create_borrowed_book(&NewBorrowedBook {
                user_id,
                book_id: book.id,
                request_id: None,
                issue_date: due - Duration::days(14),
                due_date: due,
                daily_fine_rate: Decimal::from(10),
            })
            .await
            .unwrap();
        (book.id, loan.id)
    }

    #[tokio::test]
    async fn late_return_charges_the_frozen_fine() {
        let store = MemoryLibraryStore::new();
        let feed = InProcessChangeFeed::new();
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let returned_at = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        let (book_id, loan_id) = loaned_book(&store, 20, due).await;

        let request = request_return(&store, &feed, 20, loan_id, returned_at).await.unwrap();
        let approval = approve_return(&store, &feed, request.id, 1, returned_at).await.unwrap();

        assert_eq!(approval.fine_charged, Decimal::from(40));
        assert_eq!(approval.days_overdue, 4);
        assert_eq!(approval.request.status, RequestStatus::Approved);

        let loan = store.get_borrowed_book(loan_id).await.unwrap().unwrap();
        assert_eq!(loan.return_date, Some(returned_at));
        assert_eq!(loan.total_fine, Decimal::from(40));
        assert_eq!(loan.due_fee, Decimal::from(40));
        assert!(!loan.fee_paid);

        let book = store.get_book(book_id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn on_time_return_is_settled_without_a_fee() {
        let store = MemoryLibraryStore::new();
        let feed = InProcessChangeFeed::new();
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let (_, loan_id) = loaned_book(&store, 20, due).await;

        let request = request_return(&store, &feed, 20, loan_id, due).await.unwrap();
        let approval = approve_return(&store, &feed, request.id, 1, due).await.unwrap();

        assert_eq!(approval.fine_charged, Decimal::ZERO);
        let loan = store.get_borrowed_book(loan_id).await.unwrap().unwrap();
        assert!(loan.fee_paid);
    }

    #[tokio::test]
    async fn students_can_only_return_their_own_active_loans() {
        let store = MemoryLibraryStore::new();
        let feed = InProcessChangeFeed::new();
        let due = Utc::now() + Duration::days(3);
        let (_, loan_id) = loaned_book(&store, 20, due).await;

        let error = request_return(&store, &feed, 21, loan_id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(error.error_type, AppErrorType::NotFoundError);

        request_return(&store, &feed, 20, loan_id, Utc::now()).await.unwrap();
        let error = request_return(&store, &feed, 20, loan_id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(error.error_type, AppErrorType::ConflictError);
    }

    #[tokio::test]
    async fn declined_return_keeps_the_loan_open() {
        let store = MemoryLibraryStore::new();
        let feed = InProcessChangeFeed::new();
        let due = Utc::now() + Duration::days(3);
        let (_, loan_id) = loaned_book(&store, 20, due).await;
        let request = request_return(&store, &feed, 20, loan_id, Utc::now()).await.unwrap();

        let declined = decline_return(&store, &feed, request.id, 1, Utc::now()).await.unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);
        assert!(store.get_borrowed_book(loan_id).await.unwrap().unwrap().is_active());

        let error = approve_return(&store, &feed, request.id, 1, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(error.error_type, AppErrorType::ConflictError);

        // a fresh request is allowed once the previous one is closed
        assert!(request_return(&store, &feed, 20, loan_id, Utc::now()).await.is_ok());
    }
}
