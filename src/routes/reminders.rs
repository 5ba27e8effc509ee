use crate::core::jwt_auth::AuthenticatedUser;
use crate::core::{AppError, EmailService};
use crate::models::reminders::DueReminder;
use actix_web::{post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

/// Replies with the provider's own JSON, not the usual envelope.
#[tracing::instrument(name = "Send Due Reminder", skip(email_service, _user, reminder))]
#[post("/send-reminder")]
pub async fn send_reminder(
    email_service: web::Data<EmailService>,
    _user: AuthenticatedUser,
    reminder: web::Json<DueReminder>,
) -> Result<HttpResponse, AppError> {
    reminder.validate()?;

    match email_service.send_due_reminder(&reminder).await {
        Ok(provider_response) => Ok(HttpResponse::Ok().json(provider_response)),
        Err(e) => {
            tracing::error!("Failed to send due reminder: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({ "error": e.details() })))
        }
    }
}
