use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::book_requests::PendingBookRequest;
use super::return_requests::PendingReturnRequest;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_categories: i64,
    pub total_users: i64,
    pub borrowed_count: i64,
    pub total_fees: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FineRefreshSummary {
    pub updated: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub unread: u64,
    pub pending_book_requests: usize,
    pub pending_return_requests: usize,
    pub latest_book_requests: Vec<PendingBookRequest>,
    pub latest_return_requests: Vec<PendingReturnRequest>,
}
