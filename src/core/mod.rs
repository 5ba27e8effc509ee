pub mod change_feed;
pub mod config;
pub mod email_service;
pub mod jwt_auth;
mod responses;
mod telemetry;

pub use self::config::AppConfig;
pub use email_service::{EmailError, EmailService};
pub use responses::*;
pub use telemetry::*;
