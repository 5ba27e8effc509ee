use crate::core::config::{EmailApiConfig, EmailConfig, EmailProvider, SmtpConfig};
use crate::models::reminders::DueReminder;
use crate::services::fines::parse_instant;
use askama::Template;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email provider is not configured: {0}")]
    NotConfigured(String),
    #[error("invalid email address `{0}`")]
    InvalidAddress(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to reach email provider: {0}")]
    Transport(String),
    #[error("email provider rejected the message with status {status}")]
    Rejected { status: u16, body: Value },
}

impl EmailError {
    /// JSON reported back to the caller under `error`.
    pub fn details(&self) -> Value {
        match self {
            EmailError::Rejected { body, .. } => body.clone(),
            other => json!({ "message": other.to_string() }),
        }
    }
}

#[derive(Serialize)]
struct ApiEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct EmailService {
    config: EmailConfig,
    http: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let timeout = config
            .api
            .as_ref()
            .map(|api| api.timeout_secs)
            .unwrap_or(10);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(Self { config, http })
    }

    fn sender(&self) -> String {
        format!("{} <{}>", self.config.from_name, self.config.from_email)
    }

    /// Sends the due-date reminder and returns what the provider answered.
    pub async fn send_due_reminder(&self, reminder: &DueReminder) -> Result<Value, EmailError> {
        let subject = format!("📚 Book Due Reminder: {}", reminder.book_title);
        let body = create_reminder_email_body(reminder)?;

        let result = match self.config.provider {
            EmailProvider::Api => {
                let api = self.config.api.as_ref().ok_or_else(|| {
                    EmailError::NotConfigured("email.api section is missing".to_string())
                })?;
                self.send_via_api(api, &reminder.email, &subject, &body).await
            }
            EmailProvider::Smtp => {
                let smtp = self.config.smtp.as_ref().ok_or_else(|| {
                    EmailError::NotConfigured("email.smtp section is missing".to_string())
                })?;
                self.send_via_smtp(smtp, &reminder.email, &subject, body).await
            }
        };

        match &result {
            Ok(_) => tracing::info!("Reminder email sent successfully to: {}", reminder.email),
            Err(e) => tracing::error!("Failed to send reminder email to {}: {}", reminder.email, e),
        }
        result
    }

    async fn send_via_api(
        &self,
        api: &EmailApiConfig,
        to_email: &str,
        subject: &str,
        html: &str,
    ) -> Result<Value, EmailError> {
        let from = self.sender();
        let url = format!("{}/emails", api.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(url)
            .bearer_auth(api.api_key.expose_secret())
            .json(&ApiEmail {
                from: &from,
                to: vec![to_email],
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_via_smtp(
        &self,
        smtp: &SmtpConfig,
        to_email: &str,
        subject: &str,
        html: String,
    ) -> Result<Value, EmailError> {
        let from_mailbox =
            Mailbox::from_str(&self.sender()).map_err(|_| EmailError::InvalidAddress(self.sender()))?;
        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|_| EmailError::InvalidAddress(to_email.to_string()))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let credentials = Credentials::new(
            smtp.username.clone(),
            smtp.password.expose_secret().clone(),
        );

        // port 2525 relays only speak STARTTLS
        let builder = match smtp.port {
            2525 => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host),
            _ => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host),
        }
        .map_err(|e| EmailError::Transport(e.to_string()))?;

        let mailer = builder.port(smtp.port).credentials(credentials).build();
        let response = mailer
            .send(email)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(json!({
            "code": response.code().to_string(),
            "message": response.message().collect::<Vec<_>>().join(" "),
        }))
    }
}

fn display_due_date(due_date: &str) -> String {
    parse_instant(due_date)
        .map(|instant| instant.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| due_date.to_string())
}

/// Rendered with HTML escaping, every field is caller supplied.
#[derive(Template)]
#[template(path = "due_reminder.html")]
struct DueReminderTemplate<'a> {
    user_name: &'a str,
    book_title: &'a str,
    due_date: String,
    days_remaining: i64,
}

pub fn create_reminder_email_body(reminder: &DueReminder) -> Result<String, EmailError> {
    DueReminderTemplate {
        user_name: &reminder.user_name,
        book_title: &reminder.book_title,
        due_date: display_due_date(&reminder.due_date),
        days_remaining: reminder.days_remaining,
    }
    .render()
    .map_err(|e| EmailError::Build(e.to_string()))
}
