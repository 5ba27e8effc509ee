use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::LibraryStore;
use crate::core::AppError;
use crate::models::book_requests::BookRequest;
use crate::models::books::{Book, BookPayload, BookStatus};
use crate::models::borrowed_books::{BorrowedBook, NewBorrowedBook, ReturnSettlement};
use crate::models::categories::Category;
use crate::models::profiles::{NewProfile, Profile, Role};
use crate::models::return_requests::ReturnRequest;
use crate::models::RequestStatus;

#[derive(Default)]
struct Tables {
    next_id: i32,
    books: BTreeMap<i32, Book>,
    categories: BTreeMap<i32, Category>,
    profiles: BTreeMap<i32, Profile>,
    book_requests: BTreeMap<i32, BookRequest>,
    borrowed_books: BTreeMap<i32, BorrowedBook>,
    return_requests: BTreeMap<i32, ReturnRequest>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store with the same ordering rules as the MySQL queries.
#[derive(Default)]
pub struct MemoryLibraryStore {
    tables: Mutex<Tables>,
}

impl MemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn not_found(entity: &str, id: i32) -> AppError {
    AppError::not_found(format!("{} {} was not found", entity, id))
}

#[async_trait]
impl LibraryStore for MemoryLibraryStore {
    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        let mut books: Vec<Book> = self.tables().books.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn get_book(&self, book_id: i32) -> Result<Option<Book>, AppError> {
        Ok(self.tables().books.get(&book_id).cloned())
    }

    async fn create_book(
        &self,
        payload: &BookPayload,
        created_at: DateTime<Utc>,
    ) -> Result<Book, AppError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let book = Book {
            id,
            title: payload.title.clone(),
            author: payload.author.clone(),
            isbn: payload.isbn.clone(),
            category_id: Some(payload.category_id),
            cover_image: payload.cover_image.clone(),
            total_copies: payload.total_copies,
            status: BookStatus::Available,
            created_at,
        };
        tables.books.insert(id, book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        book_id: i32,
        payload: &BookPayload,
    ) -> Result<Option<Book>, AppError> {
        let mut tables = self.tables();
        Ok(tables.books.get_mut(&book_id).map(|book| {
            book.title = payload.title.clone();
            book.author = payload.author.clone();
            book.isbn = payload.isbn.clone();
            book.category_id = Some(payload.category_id);
            book.cover_image = payload.cover_image.clone();
            book.total_copies = payload.total_copies;
            book.clone()
        }))
    }

    async fn delete_book(&self, book_id: i32) -> Result<bool, AppError> {
        Ok(self.tables().books.remove(&book_id).is_some())
    }

    async fn set_book_status(&self, book_id: i32, status: BookStatus) -> Result<(), AppError> {
        if let Some(book) = self.tables().books.get_mut(&book_id) {
            book.status = status;
        }
        Ok(())
    }

    async fn count_books(&self) -> Result<i64, AppError> {
        Ok(self.tables().books.len() as i64)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self.tables().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, category_id: i32) -> Result<Option<Category>, AppError> {
        Ok(self.tables().categories.get(&category_id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        Ok(self
            .tables()
            .categories
            .values()
            .find(|category| category.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        let mut tables = self.tables();
        if tables
            .categories
            .values()
            .any(|category| category.name.eq_ignore_ascii_case(name))
        {
            return Err(AppError::db_error(format!(
                "Duplicate entry '{}' for key 'tbl_categories.name'",
                name
            )));
        }
        let id = tables.next_id();
        let category = Category {
            id,
            name: name.to_string(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn count_categories(&self) -> Result<i64, AppError> {
        Ok(self.tables().categories.len() as i64)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError> {
        let mut tables = self.tables();
        if tables
            .profiles
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&profile.email))
        {
            return Err(AppError::db_error(format!(
                "Duplicate entry '{}' for key 'tbl_profiles.email'",
                profile.email
            )));
        }
        let id = tables.next_id();
        let created = Profile {
            id,
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            role: profile.role,
            password_hash: profile.password_hash.clone(),
            created_at: profile.created_at,
        };
        tables.profiles.insert(id, created.clone());
        Ok(created)
    }

    async fn get_profile(&self, user_id: i32) -> Result<Option<Profile>, AppError> {
        Ok(self.tables().profiles.get(&user_id).cloned())
    }

    async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        Ok(self
            .tables()
            .profiles
            .values()
            .find(|profile| profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let mut profiles: Vec<Profile> = self.tables().profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(profiles)
    }

    async fn count_profiles(&self) -> Result<i64, AppError> {
        Ok(self.tables().profiles.len() as i64)
    }

    async fn fetch_role(&self, user_id: i32) -> Result<Option<Role>, AppError> {
        Ok(self.tables().profiles.get(&user_id).map(|profile| profile.role))
    }

    async fn set_profile_role(&self, user_id: i32, role: Role) -> Result<(), AppError> {
        if let Some(profile) = self.tables().profiles.get_mut(&user_id) {
            profile.role = role;
        }
        Ok(())
    }

    async fn create_book_request(
        &self,
        user_id: i32,
        book_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<BookRequest, AppError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let request = BookRequest {
            id,
            book_id,
            user_id,
            status: RequestStatus::Pending,
            requested_at,
            reviewed_at: None,
            reviewed_by: None,
        };
        tables.book_requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get_book_request(&self, request_id: i32) -> Result<Option<BookRequest>, AppError> {
        Ok(self.tables().book_requests.get(&request_id).cloned())
    }

    async fn list_book_requests_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<BookRequest>, AppError> {
        let mut requests: Vec<BookRequest> = self
            .tables()
            .book_requests
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn list_book_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<BookRequest>, AppError> {
        let mut requests: Vec<BookRequest> = self
            .tables()
            .book_requests
            .values()
            .filter(|request| request.status == status)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn update_book_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        reviewed_by: i32,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables();
        let request = tables
            .book_requests
            .get_mut(&request_id)
            .ok_or_else(|| not_found("Book request", request_id))?;
        request.status = status;
        request.reviewed_by = Some(reviewed_by);
        request.reviewed_at = Some(reviewed_at);
        Ok(())
    }

    async fn create_borrowed_book(
        &self,
        loan: &NewBorrowedBook,
    ) -> Result<BorrowedBook, AppError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let borrowed = BorrowedBook {
            id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            request_id: loan.request_id,
            issue_date: loan.issue_date,
            due_date: loan.due_date,
            return_date: None,
            daily_fine_rate: loan.daily_fine_rate,
            total_fine: Decimal::ZERO,
            due_fee: Decimal::ZERO,
            fee_paid: false,
            last_fine_update: None,
        };
        tables.borrowed_books.insert(id, borrowed.clone());
        Ok(borrowed)
    }

    async fn get_borrowed_book(&self, loan_id: i32) -> Result<Option<BorrowedBook>, AppError> {
        Ok(self.tables().borrowed_books.get(&loan_id).cloned())
    }

    async fn list_active_loans(&self) -> Result<Vec<BorrowedBook>, AppError> {
        let mut loans: Vec<BorrowedBook> = self
            .tables()
            .borrowed_books
            .values()
            .filter(|loan| loan.is_active())
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(loans)
    }

    async fn list_active_loans_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<BorrowedBook>, AppError> {
        let mut loans: Vec<BorrowedBook> = self
            .tables()
            .borrowed_books
            .values()
            .filter(|loan| loan.user_id == user_id && loan.is_active())
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(b.id.cmp(&a.id)));
        Ok(loans)
    }

    async fn count_active_loans_for_book(&self, book_id: i32) -> Result<i64, AppError> {
        Ok(self
            .tables()
            .borrowed_books
            .values()
            .filter(|loan| loan.book_id == book_id && loan.is_active())
            .count() as i64)
    }

    async fn count_active_loans_for_user(&self, user_id: i32) -> Result<i64, AppError> {
        Ok(self
            .tables()
            .borrowed_books
            .values()
            .filter(|loan| loan.user_id == user_id && loan.is_active())
            .count() as i64)
    }

    async fn active_loan_counts(&self) -> Result<HashMap<i32, i64>, AppError> {
        let mut counts = HashMap::new();
        for loan in self.tables().borrowed_books.values() {
            if loan.is_active() {
                *counts.entry(loan.book_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn update_loan_fine(
        &self,
        loan_id: i32,
        fine: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables();
        let loan = tables
            .borrowed_books
            .get_mut(&loan_id)
            .ok_or_else(|| not_found("Loan", loan_id))?;
        loan.total_fine = fine;
        loan.due_fee = fine;
        loan.last_fine_update = Some(updated_at);
        Ok(())
    }

    async fn settle_loan(
        &self,
        loan_id: i32,
        settlement: &ReturnSettlement,
    ) -> Result<(), AppError> {
        let mut tables = self.tables();
        let loan = tables
            .borrowed_books
            .get_mut(&loan_id)
            .ok_or_else(|| not_found("Loan", loan_id))?;
        loan.return_date = Some(settlement.return_date);
        loan.total_fine = settlement.total_fine;
        loan.due_fee = settlement.total_fine;
        loan.last_fine_update = Some(settlement.return_date);
        loan.fee_paid = settlement.fee_paid;
        Ok(())
    }

    async fn create_return_request(
        &self,
        borrowed_book_id: i32,
        user_id: i32,
        requested_at: DateTime<Utc>,
    ) -> Result<ReturnRequest, AppError> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let request = ReturnRequest {
            id,
            borrowed_book_id,
            user_id,
            status: RequestStatus::Pending,
            requested_at,
            processed_at: None,
            processed_by: None,
        };
        tables.return_requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get_return_request(
        &self,
        request_id: i32,
    ) -> Result<Option<ReturnRequest>, AppError> {
        Ok(self.tables().return_requests.get(&request_id).cloned())
    }

    async fn list_return_requests_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ReturnRequest>, AppError> {
        let mut requests: Vec<ReturnRequest> = self
            .tables()
            .return_requests
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn list_return_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<ReturnRequest>, AppError> {
        let mut requests: Vec<ReturnRequest> = self
            .tables()
            .return_requests
            .values()
            .filter(|request| request.status == status)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn find_pending_return_request(
        &self,
        borrowed_book_id: i32,
    ) -> Result<Option<ReturnRequest>, AppError> {
        Ok(self
            .tables()
            .return_requests
            .values()
            .find(|request| {
                request.borrowed_book_id == borrowed_book_id
                    && request.status == RequestStatus::Pending
            })
            .cloned())
    }

    async fn update_return_request_status(
        &self,
        request_id: i32,
        status: RequestStatus,
        processed_by: i32,
        processed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables();
        let request = tables
            .return_requests
            .get_mut(&request_id)
            .ok_or_else(|| not_found("Return request", request_id))?;
        request.status = status;
        request.processed_by = Some(processed_by);
        request.processed_at = Some(processed_at);
        Ok(())
    }
}
