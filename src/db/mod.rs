//! Data access.
//!
//! Handlers and workflows only talk to [`LibraryStore`]. The MySQL backend
//! lives in the per-table modules and is wired up by [`MySqlLibraryStore`];
//! [`MemoryLibraryStore`] keeps everything in process for local runs and tests.
//!
//! Nothing here is transactional: callers count, then act.

pub mod book_requests;
pub mod books;
pub mod borrowed_books;
pub mod categories;
pub mod memory;
pub mod mysql_store;
pub mod profiles;
pub mod return_requests;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::AppError;
use crate::models::book_requests::BookRequest;
use crate::models::books::{Book, BookPayload, BookStatus};
use crate::models::borrowed_books::{BorrowedBook, NewBorrowedBook, ReturnSettlement};
use crate::models::categories::Category;
use crate::models::profiles::{NewProfile, Profile, Role};
use crate::models::return_requests::ReturnRequest;
use crate::models::RequestStatus;

pub use memory::MemoryLibraryStore;
pub use mysql_store::MySqlLibraryStore;

#[async_trait]
pub trait LibraryStore: Send + Sync {
    // books
    async fn list_books(&self) -> Result<Vec<Book>, AppError>;
    async fn get_book(&self, book_id: i32) -> Result<Option<Book>, AppError>;
    async fn create_book(
        &self,
        payload: &BookPayload,
        created_at: DateTime<Utc>,
    ) -> Result<Book, AppError>;
    async fn update_book(
        &self,
        book_id: i32,
        payload: &BookPayload,
    ) -> Result<Option<Book>, AppError>;
    async fn delete_book(&self, book_id: i32) -> Result<bool, AppError>;
    async fn set_book_status(&self, book_id: i32, status: BookStatus) -> Result<(), AppError>;
    async fn count_books(&self) -> Result<i64, AppError>;

    // categories
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, category_id: i32) -> Result<Option<Category>, AppError>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError>;
    async fn create_category(&self, name: &str) -> Result<Category, AppError>;
    async fn count_categories(&self) -> Result<i64, AppError>;

    // profiles
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError>;
    async fn get_profile(&self, user_id: i32) -> Result<Option<Profile>, AppError>;
    async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AppError>;
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;
    async fn count_profiles(&self) -> Result<i64, AppError>;
    async fn fetch_role(&self, user_id: i32) -> Result<Option<Role>, AppError>;
    async fn set_profile_role(&self, user_id: i32, role: Role) -> Result<(), AppError>;

    // borrow requests
    async fn create_book_request(
        &self,
        user_id: i32,
        book_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<BookRequest, AppError>;
    async fn get_book_request(&self, request_id: i32) -> Result<Option<BookRequest>, AppError>;
    async fn list_book_requests_for_user(&self, user_id: i32)
        -> Result<Vec<BookRequest>, AppError>;
    async fn list_book_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<BookRequest>, AppError>;
    async fn update_book_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        reviewed_by: i32,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    // loans
    async fn create_borrowed_book(&self, loan: &NewBorrowedBook)
        -> Result<BorrowedBook, AppError>;
    async fn get_borrowed_book(&self, loan_id: i32) -> Result<Option<BorrowedBook>, AppError>;
    async fn list_active_loans(&self) -> Result<Vec<BorrowedBook>, AppError>;
    async fn list_active_loans_for_user(&self, user_id: i32)
        -> Result<Vec<BorrowedBook>, AppError>;
    async fn count_active_loans_for_book(&self, book_id: i32) -> Result<i64, AppError>;
    async fn count_active_loans_for_user(&self, user_id: i32) -> Result<i64, AppError>;
    async fn active_loan_counts(&self) -> Result<HashMap<i32, i64>, AppError>;
    async fn update_loan_fine(
        &self,
        loan_id: i32,
        fine: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn settle_loan(&self, loan_id: i32, settlement: &ReturnSettlement)
        -> Result<(), AppError>;

    // return requests
    async fn create_return_request(
        &self,
        borrowed_book_id: i32,
        user_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<ReturnRequest, AppError>;
    async fn get_return_request(&self, request_id: i32)
        -> Result<Option<ReturnRequest>, AppError>;
    async fn list_return_requests_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ReturnRequest>, AppError>;
    async fn list_return_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<ReturnRequest>, AppError>;
    async fn find_pending_return_request(
        &self,
        borrowed_book_id: i32,
    ) -> Result<Option<ReturnRequest>, AppError>;
    async fn update_return_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        processed_by: i32,
        processed_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}
