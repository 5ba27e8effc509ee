use std::collections::HashMap;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::core::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::core::config::LibraryPolicy;
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::books::{BlockedReason, Book, BookFilter, BookPayload, BookStatus, CatalogBook};
use crate::models::categories::{Category, CreateCategoryRequest};
use crate::models::pagination::{PaginationMeta, PaginationQuery};
use crate::models::RequestStatus;

pub fn available_copies(book: &Book, active_loans: i64) -> i64 {
    i64::from(book.total_copies) - active_loans
}

/// Why a student cannot ask for a book right now, checked in the same order
/// the borrow workflow rejects.
pub fn blocked_reason(
    available_copies: i64,
    has_pending_request: bool,
    student_active_loans: i64,
    max_active_loans: u32,
) -> Option<BlockedReason> {
    if student_active_loans >= i64::from(max_active_loans) {
        Some(BlockedReason::LoanLimit)
    } else if available_copies <= 0 {
        Some(BlockedReason::NoCopies)
    } else if has_pending_request {
        Some(BlockedReason::PendingRequest)
    } else {
        None
    }
}

async fn category_names(store: &dyn LibraryStore) -> Result<HashMap<i32, String>, AppError> {
    Ok(store
        .list_categories()
        .await?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect())
}

async fn catalog_page(
    store: &dyn LibraryStore,
    filter: &BookFilter,
    pagination: &PaginationQuery,
) -> Result<(Vec<CatalogBook>, PaginationMeta), AppError> {
    let mut pagination = pagination.clone();
    pagination.validate();

    let books: Vec<Book> = store
        .list_books()
        .await?
        .into_iter()
        .filter(|book| filter.matches(book))
        .collect();
    let (books, total_items) = pagination.paginate(books);

    let loans = store.active_loan_counts().await?;
    let categories = category_names(store).await?;

    let entries = books
        .into_iter()
        .map(|book| {
            let active_loans = loans.get(&book.id).copied().unwrap_or(0);
            CatalogBook {
                category_name: book.category_id.and_then(|id| categories.get(&id).cloned()),
                available_copies: available_copies(&book, active_loans),
                active_loans,
                book,
                requestable: None,
                blocked_reason: None,
            }
        })
        .collect();

    let meta = PaginationMeta::new(pagination.page, pagination.per_page, total_items);
    Ok((entries, meta))
}

/// Public and admin catalog view.
pub async fn list_catalog(
    store: &dyn LibraryStore,
    filter: &BookFilter,
    pagination: &PaginationQuery,
) -> Result<(Vec<CatalogBook>, PaginationMeta), AppError> {
    catalog_page(store, filter, pagination).await
}

/// Catalog as a given student sees it, with a per-book request verdict.
pub async fn list_catalog_for_student(
    store: &dyn LibraryStore,
    policy: &LibraryPolicy,
    user_id: i32,
    filter: &BookFilter,
    pagination: &PaginationQuery,
) -> Result<(Vec<CatalogBook>, PaginationMeta), AppError> {
    let (mut entries, meta) = catalog_page(store, filter, pagination).await?;

    let student_loans = store.count_active_loans_for_user(user_id).await?;
    let pending_books: Vec<i32> = store
        .list_book_requests_for_user(user_id)
        .await?
        .into_iter()
        .filter(|request| request.status == RequestStatus::Pending)
        .map(|request| request.book_id)
        .collect();

    for entry in entries.iter_mut() {
        let reason = blocked_reason(
            entry.available_copies,
            pending_books.contains(&entry.book.id),
            student_loans,
            policy.max_active_loans,
        );
        entry.requestable = Some(reason.is_none());
        entry.blocked_reason = reason;
    }

    Ok((entries, meta))
}

pub async fn get_catalog_book(
    store: &dyn LibraryStore,
    book_id: i32,
) -> Result<CatalogBook, AppError> {
    let book = store
        .get_book(book_id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;
    let active_loans = store.count_active_loans_for_book(book.id).await?;
    let category_name = match book.category_id {
        Some(id) => store.get_category(id).await?.map(|category| category.name),
        None => None,
    };

    Ok(CatalogBook {
        category_name,
        available_copies: available_copies(&book, active_loans),
        active_loans,
        book,
        requestable: None,
        blocked_reason: None,
    })
}

/// Re-derives the cached status label from a fresh loan count.
pub async fn recompute_book_status(
    store: &dyn LibraryStore,
    book_id: i32,
) -> Result<Option<BookStatus>, AppError> {
    let book = match store.get_book(book_id).await? {
        Some(book) => book,
        None => return Ok(None),
    };
    let active_loans = store.count_active_loans_for_book(book_id).await?;
    let status = BookStatus::for_available_copies(available_copies(&book, active_loans));

    if status != book.status {
        store.set_book_status(book_id, status).await?;
        tracing::info!(book_id, status = status.as_str(), "book status changed");
    }
    Ok(Some(status))
}

async fn ensure_category_exists(store: &dyn LibraryStore, category_id: i32) -> Result<(), AppError> {
    match store.get_category(category_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::bad_request("Please select a valid category")),
    }
}

pub async fn create_book(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    payload: &BookPayload,
    now: DateTime<Utc>,
) -> Result<Book, AppError> {
    payload.validate()?;
    ensure_category_exists(store, payload.category_id).await?;

    let book = store.create_book(payload, now).await?;
    feed.publish(ChangeEvent::new(Table::Books, ChangeKind::Insert, book.id));
    Ok(book)
}

pub async fn update_book(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    book_id: i32,
    payload: &BookPayload,
) -> Result<Book, AppError> {
    payload.validate()?;
    ensure_category_exists(store, payload.category_id).await?;

    let mut book = store
        .update_book(book_id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    // total_copies may have moved, so the label can flip either way
    if let Some(status) = recompute_book_status(store, book_id).await? {
        book.status = status;
    }
    feed.publish(ChangeEvent::new(Table::Books, ChangeKind::Update, book_id));
    Ok(book)
}

pub async fn delete_book(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    book_id: i32,
) -> Result<(), AppError> {
    if !store.delete_book(book_id).await? {
        return Err(AppError::not_found("Book not found"));
    }
    feed.publish(ChangeEvent::new(Table::Books, ChangeKind::Delete, book_id));
    Ok(())
}

pub async fn list_categories(store: &dyn LibraryStore) -> Result<Vec<Category>, AppError> {
    store.list_categories().await
}

pub async fn create_category(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    payload: &CreateCategoryRequest,
) -> Result<Category, AppError> {
    payload.validate()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Please enter category name"));
    }
    if store.find_category_by_name(name).await?.is_some() {
        return Err(AppError::conflict(format!(
            "A category named '{}' already exists",
            name
        )));
    }

    let category = store.create_category(name).await?;
    feed.publish(ChangeEvent::new(
        Table::Categories,
        ChangeKind::Insert,
        category.id,
    ));
    Ok(category)
}
