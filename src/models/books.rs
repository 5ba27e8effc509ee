use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Cached availability label. Recomputed from a fresh loan count, never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Unavailable,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Unavailable => "Unavailable",
        }
    }

    pub fn for_available_copies(available_copies: i64) -> Self {
        if available_copies <= 0 {
            BookStatus::Unavailable
        } else {
            BookStatus::Available
        }
    }
}

impl TryFrom<String> for BookStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Available" => Ok(BookStatus::Available),
            "Unavailable" => Ok(BookStatus::Unavailable),
            other => Err(format!("Invalid book status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category_id: Option<i32>,
    pub cover_image: Option<String>,
    pub total_copies: i32,
    #[sqlx(try_from = "String")]
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BookPayload {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, max = 32, message = "ISBN is required"))]
    pub isbn: String,
    pub category_id: i32,
    #[validate(url(message = "Cover image must be a valid URL"))]
    pub cover_image: Option<String>,
    #[serde(default = "default_total_copies")]
    #[validate(range(min = 1, message = "Total copies must be at least 1"))]
    pub total_copies: i32,
}

fn default_total_copies() -> i32 {
    10
}

#[derive(Debug, Deserialize, Default)]
pub struct BookFilter {
    /// Case-insensitive match against title or author.
    pub q: Option<String>,
    pub category_id: Option<i32>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        let matches_search = match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                book.title.to_lowercase().contains(&q) || book.author.to_lowercase().contains(&q)
            }
            _ => true,
        };
        let matches_category = match self.category_id {
            Some(category_id) => book.category_id == Some(category_id),
            None => true,
        };
        matches_search && matches_category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedReason {
    NoCopies,
    PendingRequest,
    LoanLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogBook {
    #[serde(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
    pub active_loans: i64,
    pub available_copies: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<BlockedReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            cover_image: book.cover_image.clone(),
        }
    }
}
