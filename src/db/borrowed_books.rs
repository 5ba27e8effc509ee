use std::collections::HashMap;

use crate::core::AppError;
use crate::models::borrowed_books::{BorrowedBook, NewBorrowedBook, ReturnSettlement};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

const LOAN_COLUMNS: &str = "id, user_id, book_id, request_id, issue_date, due_date, return_date, \
     daily_fine_rate, total_fine, due_fee, fee_paid, last_fine_update";

pub async fn insert_borrowed_book(
    pool: &MySqlPool,
    loan: &NewBorrowedBook,
) -> Result<BorrowedBook, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_borrowed_books
        (user_id, book_id, request_id, issue_date, due_date, daily_fine_rate, total_fine, due_fee, fee_paid)
        VALUES (?, ?, ?, ?, ?, ?, 0, 0, FALSE)
        "#,
    )
    .bind(loan.user_id)
    .bind(loan.book_id)
    .bind(loan.request_id)
    .bind(loan.issue_date)
    .bind(loan.due_date)
    .bind(loan.daily_fine_rate)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let loan_id = result.last_insert_id() as i32;
    fetch_borrowed_book_by_id(pool, loan_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted loan could not be read back"))
}

pub async fn fetch_borrowed_book_by_id(
    pool: &MySqlPool,
    loan_id: i32,
) -> Result<Option<BorrowedBook>, AppError> {
    let loan = sqlx::query_as::<_, BorrowedBook>(&format!(
        "SELECT {} FROM tbl_borrowed_books WHERE id = ?",
        LOAN_COLUMNS
    ))
    .bind(loan_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(loan)
}

pub async fn fetch_active_loans(pool: &MySqlPool) -> Result<Vec<BorrowedBook>, AppError> {
    let loans = sqlx::query_as::<_, BorrowedBook>(&format!(
        "SELECT {} FROM tbl_borrowed_books WHERE return_date IS NULL ORDER BY due_date ASC",
        LOAN_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(loans)
}

pub async fn fetch_active_loans_by_user(
    pool: &MySqlPool,
    user_id: i32,
) -> Result<Vec<BorrowedBook>, AppError> {
    let loans = sqlx::query_as::<_, BorrowedBook>(&format!(
        "SELECT {} FROM tbl_borrowed_books WHERE user_id = ? AND return_date IS NULL \
         ORDER BY issue_date DESC, id DESC",
        LOAN_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(loans)
}

pub async fn count_active_loans_by_book(pool: &MySqlPool, book_id: i32) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tbl_borrowed_books WHERE book_id = ? AND return_date IS NULL",
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(count)
}

pub async fn count_active_loans_by_user(pool: &MySqlPool, user_id: i32) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tbl_borrowed_books WHERE user_id = ? AND return_date IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(count)
}

pub async fn fetch_active_loan_counts(pool: &MySqlPool) -> Result<HashMap<i32, i64>, AppError> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT book_id, COUNT(*)
        FROM tbl_borrowed_books
        WHERE return_date IS NULL
        GROUP BY book_id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(rows.into_iter().collect())
}

pub async fn update_fine(
    pool: &MySqlPool,
    loan_id: i32,
    fine: Decimal,
    updated_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tbl_borrowed_books
        SET total_fine = ?, due_fee = ?, last_fine_update = ?
        WHERE id = ?
        "#,
    )
    .bind(fine)
    .bind(fine)
    .bind(updated_at)
    .bind(loan_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}

pub async fn settle_loan(
    pool: &MySqlPool,
    loan_id: i32,
    settlement: &ReturnSettlement,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tbl_borrowed_books
        SET return_date = ?, total_fine = ?, due_fee = ?, last_fine_update = ?, fee_paid = ?
        WHERE id = ?
        "#,
    )
    .bind(settlement.return_date)
    .bind(settlement.total_fine)
    .bind(settlement.total_fine)
    .bind(settlement.return_date)
    .bind(settlement.fee_paid)
    .bind(loan_id)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}
