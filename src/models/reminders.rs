use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body accepted by the due-date reminder endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DueReminder {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    pub user_name: String,
    pub book_title: String,
    pub due_date: String,
    pub days_remaining: i64,
}
