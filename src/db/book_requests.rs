use crate::core::AppError;
use crate::models::book_requests::BookRequest;
use crate::models::RequestStatus;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

const REQUEST_COLUMNS: &str =
    "id, book_id, user_id, status, requested_at, reviewed_at, reviewed_by";

pub async fn insert_book_request(
    pool: &MySqlPool,
    user_id: i32,
    book_id: i32,
    requested_at: DateTime<Utc>,
) -> Result<BookRequest, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_book_requests (book_id, user_id, status, requested_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(book_id)
    .bind(user_id)
    .bind(RequestStatus::Pending.as_str())
    .bind(requested_at)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let request_id = result.last_insert_id() as i32;
    fetch_book_request_by_id(pool, request_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted book request could not be read back"))
}

pub async fn fetch_book_request_by_id(
    pool: &MySqlPool,
    request_id: i32,
) -> Result<Option<BookRequest>, AppError> {
    let request = sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {} FROM tbl_book_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(request)
}

pub async fn fetch_book_requests_by_user(
    pool: &MySqlPool,
    user_id: i32,
) -> Result<Vec<BookRequest>, AppError> {
    let requests = sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {} FROM tbl_book_requests WHERE user_id = ? ORDER BY requested_at DESC, id DESC",
        REQUEST_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(requests)
}

pub async fn fetch_book_requests_by_status(
    pool: &MySqlPool,
    status: RequestStatus,
) -> Result<Vec<BookRequest>, AppError> {
    let requests = sqlx::query_as::<_, BookRequest>(&format!(
        "SELECT {} FROM tbl_book_requests WHERE status = ? ORDER BY requested_at DESC, id DESC",
        REQUEST_COLUMNS
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(requests)
}

pub async fn update_book_request_status(
    pool: &MySqlPool,
    request_id: i32,
    status: RequestStatus,
    reviewed_by: i32,
    reviewed_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tbl_book_requests
        SET status = ?, reviewed_at = ?, reviewed_by = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(reviewed_at)
    .bind(reviewed_by)
    .bind(request_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}
