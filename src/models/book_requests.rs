use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::core::AppError;
use crate::services::fines::parse_instant;

use super::books::BookSummary;
use super::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookRequest {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateBookRequest {
    pub book_id: i32,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ApproveBookRequest {
    /// `YYYY-MM-DD` or RFC 3339. Falls back to the configured loan length when absent.
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

impl ApproveBookRequest {
    /// An empty body means "use the default loan length"; anything else must parse.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::bad_request(format!("Invalid approval details: {}", e)))
    }
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_instant(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// A student's own request with the book it points at.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentBookRequest {
    #[serde(flatten)]
    pub request: BookRequest,
    pub book: Option<BookSummary>,
}

/// A pending request as the admin queue shows it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingBookRequest {
    #[serde(flatten)]
    pub request: BookRequest,
    pub book: Option<BookSummary>,
    pub requester_name: Option<String>,
    pub total_copies: i32,
    pub available_copies: i64,
}
