use crate::core::AppError;
use crate::models::books::{Book, BookPayload, BookStatus};
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, category_id, cover_image, total_copies, status, created_at";

pub async fn fetch_books(pool: &MySqlPool) -> Result<Vec<Book>, AppError> {
    let books = sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM tbl_books ORDER BY title",
        BOOK_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(books)
}

pub async fn fetch_book_by_id(pool: &MySqlPool, book_id: i32) -> Result<Option<Book>, AppError> {
    let book = sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM tbl_books WHERE id = ?",
        BOOK_COLUMNS
    ))
    .bind(book_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(book)
}

pub async fn insert_book(
    pool: &MySqlPool,
    payload: &BookPayload,
    created_at: DateTime<Utc>,
) -> Result<Book, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_books (title, author, isbn, category_id, cover_image, total_copies, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.author)
    .bind(&payload.isbn)
    .bind(payload.category_id)
    .bind(&payload.cover_image)
    .bind(payload.total_copies)
    .bind(BookStatus::Available.as_str())
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let book_id = result.last_insert_id() as i32;
    fetch_book_by_id(pool, book_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted book could not be read back"))
}

pub async fn update_book(
    pool: &MySqlPool,
    book_id: i32,
    payload: &BookPayload,
) -> Result<Option<Book>, AppError> {
    sqlx::query(
        r#"
        UPDATE tbl_books
        SET title = ?, author = ?, isbn = ?, category_id = ?, cover_image = ?, total_copies = ?
        WHERE id = ?
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.author)
    .bind(&payload.isbn)
    .bind(payload.category_id)
    .bind(&payload.cover_image)
    .bind(payload.total_copies)
    .bind(book_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_book_by_id(pool, book_id).await
}

pub async fn delete_book(pool: &MySqlPool, book_id: i32) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tbl_books WHERE id = ?")
        .bind(book_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_book_status(
    pool: &MySqlPool,
    book_id: i32,
    status: BookStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE tbl_books SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(book_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(())
}

pub async fn count_books(pool: &MySqlPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_books")
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(count)
}
