use crate::core::AppError;
use crate::models::return_requests::ReturnRequest;
use crate::models::RequestStatus;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

const RETURN_COLUMNS: &str =
    "id, borrowed_book_id, user_id, status, requested_at, processed_at, processed_by";

pub async fn insert_return_request(
    pool: &MySqlPool,
    borrowed_book_id: i32,
    user_id: i32,
    requested_at: DateTime<Utc>,
) -> Result<ReturnRequest, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_return_requests (borrowed_book_id, user_id, status, requested_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(borrowed_book_id)
    .bind(user_id)
    .bind(RequestStatus::Pending.as_str())
    .bind(requested_at)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let request_id = result.last_insert_id() as i32;
    fetch_return_request_by_id(pool, request_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted return request could not be read back"))
}

pub async fn fetch_return_request_by_id(
    pool: &MySqlPool,
    request_id: i32,
) -> Result<Option<ReturnRequest>, AppError> {
    let request = sqlx::query_as::<_, ReturnRequest>(&format!(
        "SELECT {} FROM tbl_return_requests WHERE id = ?",
        RETURN_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(request)
}

pub async fn fetch_return_requests_by_user(
    pool: &MySqlPool,
    user_id: i32,
) -> Result<Vec<ReturnRequest>, AppError> {
    let requests = sqlx::query_as::<_, ReturnRequest>(&format!(
        "SELECT {} FROM tbl_return_requests WHERE user_id = ? ORDER BY requested_at DESC, id DESC",
        RETURN_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(requests)
}

pub async fn fetch_return_requests_by_status(
    pool: &MySqlPool,
    status: RequestStatus,
) -> Result<Vec<ReturnRequest>, AppError> {
    let requests = sqlx::query_as::<_, ReturnRequest>(&format!(
        "SELECT {} FROM tbl_return_requests WHERE status = ? ORDER BY requested_at DESC, id DESC",
        RETURN_COLUMNS
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(requests)
}

pub async fn fetch_pending_return_request(
    pool: &MySqlPool,
    borrowed_book_id: i32,
) -> Result<Option<ReturnRequest>, AppError> {
    let request = sqlx::query_as::<_, ReturnRequest>(&format!(
        "SELECT {} FROM tbl_return_requests WHERE borrowed_book_id = ? AND status = ? LIMIT 1",
        RETURN_COLUMNS
    ))
    .bind(borrowed_book_id)
    .bind(RequestStatus::Pending.as_str())
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(request)
}

pub async fn update_return_request_status(
    pool: &MySqlPool,
    request_id: i32,
    status: RequestStatus,
    processed_by: i32,
    processed_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tbl_return_requests
        SET status = ?, processed_at = ?, processed_by = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(processed_at)
    .bind(processed_by)
    .bind(request_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}
