use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::books::BookSummary;
use super::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReturnRequest {
    pub id: i32,
    pub borrowed_book_id: i32,
    pub user_id: i32,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateReturnRequest {
    pub borrowed_book_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentReturnRequest {
    #[serde(flatten)]
    pub request: ReturnRequest,
    pub book: Option<BookSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingReturnRequest {
    #[serde(flatten)]
    pub request: ReturnRequest,
    pub book: Option<BookSummary>,
    pub requester_name: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnApproval {
    pub request: ReturnRequest,
    pub fine_charged: Decimal,
    pub days_overdue: i64,
}
