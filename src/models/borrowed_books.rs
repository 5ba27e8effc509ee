use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::books::BookSummary;
use crate::services::fines::FineCalculation;

/// One loan. `return_date == None` marks it active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BorrowedBook {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub request_id: Option<i32>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub daily_fine_rate: Decimal,
    pub total_fine: Decimal,
    pub due_fee: Decimal,
    pub fee_paid: bool,
    pub last_fine_update: Option<DateTime<Utc>>,
}

impl BorrowedBook {
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewBorrowedBook {
    pub user_id: i32,
    pub book_id: i32,
    pub request_id: Option<i32>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub daily_fine_rate: Decimal,
}

/// Final figures written when a return is approved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSettlement {
    pub return_date: DateTime<Utc>,
    pub total_fine: Decimal,
    pub fee_paid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveLoan {
    #[serde(flatten)]
    pub loan: BorrowedBook,
    pub book: Option<BookSummary>,
    pub borrower_name: Option<String>,
    pub days_remaining: i64,
    pub fine: FineCalculation,
}
