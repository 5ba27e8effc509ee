use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use super::{book_requests, books, borrowed_books, categories, profiles, return_requests};
use super::LibraryStore;
use crate::core::AppError;
use crate::models::book_requests::BookRequest;
use crate::models::books::{Book, BookPayload, BookStatus};
use crate::models::borrowed_books::{BorrowedBook, NewBorrowedBook, ReturnSettlement};
use crate::models::categories::Category;
use crate::models::profiles::{NewProfile, Profile, Role};
use crate::models::return_requests::ReturnRequest;
use crate::models::RequestStatus;

#[derive(Clone)]
pub struct MySqlLibraryStore {
    pool: MySqlPool,
}

impl MySqlLibraryStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl LibraryStore for MySqlLibraryStore {
    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        books::fetch_books(&self.pool).await
    }

    async fn get_book(&self, book_id: i32) -> Result<Option<Book>, AppError> {
        books::fetch_book_by_id(&self.pool, book_id).await
    }

    async fn create_book(
        &self,
        payload: &BookPayload,
        created_at: DateTime<Utc>,
    ) -> Result<Book, AppError> {
        books::insert_book(&self.pool, payload, created_at).await
    }

    async fn update_book(
        &self,
        book_id: i32,
        payload: &BookPayload,
    ) -> Result<Option<Book>, AppError> {
        books::update_book(&self.pool, book_id, payload).await
    }

    async fn delete_book(&self, book_id: i32) -> Result<bool, AppError> {
        books::delete_book(&self.pool, book_id).await
    }

    async fn set_book_status(&self, book_id: i32, status: BookStatus) -> Result<(), AppError> {
        books::update_book_status(&self.pool, book_id, status).await
    }

    async fn count_books(&self) -> Result<i64, AppError> {
        books::count_books(&self.pool).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        categories::fetch_categories(&self.pool).await
    }

    async fn get_category(&self, category_id: i32) -> Result<Option<Category>, AppError> {
        categories::fetch_category_by_id(&self.pool, category_id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        categories::fetch_category_by_name(&self.pool, name).await
    }

    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        categories::insert_category(&self.pool, name).await
    }

    async fn count_categories(&self) -> Result<i64, AppError> {
        categories::count_categories(&self.pool).await
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError> {
        profiles::insert_profile(&self.pool, profile).await
    }

    async fn get_profile(&self, user_id: i32) -> Result<Option<Profile>, AppError> {
        profiles::fetch_profile_by_id(&self.pool, user_id).await
    }

    async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        profiles::fetch_profile_by_email(&self.pool, email).await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        profiles::fetch_profiles(&self.pool).await
    }

    async fn count_profiles(&self) -> Result<i64, AppError> {
        profiles::count_profiles(&self.pool).await
    }

    async fn fetch_role(&self, user_id: i32) -> Result<Option<Role>, AppError> {
        profiles::fetch_role(&self.pool, user_id).await
    }

    async fn set_profile_role(&self, user_id: i32, role: Role) -> Result<(), AppError> {
        profiles::update_role(&self.pool, user_id, role).await
    }

    async fn create_book_request(
        &self,
        user_id: i32,
        book_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<BookRequest, AppError> {
        book_requests::insert_book_request(&self.pool, user_id, book_id, requested_at).await
    }

    async fn get_book_request(&self, request_id: i32) -> Result<Option<BookRequest>, AppError> {
        book_requests::fetch_book_request_by_id(&self.pool, request_id).await
    }

    async fn list_book_requests_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<BookRequest>, AppError> {
        book_requests::fetch_book_requests_by_user(&self.pool, user_id).await
    }

    async fn list_book_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<BookRequest>, AppError> {
        book_requests::fetch_book_requests_by_status(&self.pool, status).await
    }

    async fn update_book_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        reviewed_by: i32,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        book_requests::update_book_request_status(
            &self.pool,
            request_id,
            status,
            reviewed_by,
            reviewed_at,
        )
        .await
    }

    async fn create_borrowed_book(
        &self,
        loan: &NewBorrowedBook,
    ) -> Result<BorrowedBook, AppError> {
        borrowed_books::insert_borrowed_book(&self.pool, loan).await
    }

    async fn get_borrowed_book(&self, loan_id: i32) -> Result<Option<BorrowedBook>, AppError> {
        borrowed_books::fetch_borrowed_book_by_id(&self.pool, loan_id).await
    }

    async fn list_active_loans(&self) -> Result<Vec<BorrowedBook>, AppError> {
        borrowed_books::fetch_active_loans(&self.pool).await
    }

    async fn list_active_loans_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<BorrowedBook>, AppError> {
        borrowed_books::fetch_active_loans_by_user(&self.pool, user_id).await
    }

    async fn count_active_loans_for_book(&self, book_id: i32) -> Result<i64, AppError> {
        borrowed_books::count_active_loans_by_book(&self.pool, book_id).await
    }

    async fn count_active_loans_for_user(&self, user_id: i32) -> Result<i64, AppError> {
        borrowed_books::count_active_loans_by_user(&self.pool, user_id).await
    }

    async fn active_loan_counts(&self) -> Result<HashMap<i32, i64>, AppError> {
        borrowed_books::fetch_active_loan_counts(&self.pool).await
    }

    async fn update_loan_fine(
        &self,
        loan_id: i32,
        fine: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        borrowed_books::update_fine(&self.pool, loan_id, fine, updated_at).await
    }

    async fn settle_loan(
        &self,
        loan_id: i32,
        settlement: &ReturnSettlement,
    ) -> Result<(), AppError> {
        borrowed_books::settle_loan(&self.pool, loan_id, settlement).await
    }

    async fn create_return_request(
        &self,
        borrowed_book_id: i32,
        user_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<ReturnRequest, AppError> {
        return_requests::insert_return_request(&self.pool, borrowed_book_id, user_id, requested_at)
            .await
    }

    async fn get_return_request(
        &self,
        request_id: i32,
    ) -> Result<Option<ReturnRequest>, AppError> {
        return_requests::fetch_return_request_by_id(&self.pool, request_id).await
    }

    async fn list_return_requests_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ReturnRequest>, AppError> {
        return_requests::fetch_return_requests_by_user(&self.pool, user_id).await
    }

    async fn list_return_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<ReturnRequest>, AppError> {
        return_requests::fetch_return_requests_by_status(&self.pool, status).await
    }

    async fn find_pending_return_request(
        &self,
        borrowed_book_id: i32,
    ) -> Result<Option<ReturnRequest>, AppError> {
        return_requests::fetch_pending_return_request(&self.pool, borrowed_book_id).await
    }

    async fn update_return_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        processed_by: i32,
        processed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        return_requests::update_return_request_status(
            &self.pool,
            request_id,
            status,
            processed_by,
            processed_at,
        )
        .await
    }
}
