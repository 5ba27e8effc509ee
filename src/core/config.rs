use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub library_server_config: LibraryWebServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub mysql: MySqlConfig,
    pub jwt_auth_config: JwtAuthConfig,
    #[serde(default)]
    pub library: LibraryPolicy,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir().map_err(|e| {
            config::ConfigError::Message(format!("Failed to find the current dir: {}", e))
        })?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("LIBRARY_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            .add_source(
                config::Environment::with_prefix("LIBRARY_APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = configurations.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Rejects settings the service cannot run without.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt_auth_config.secret.expose_secret().trim().is_empty() {
            return Err(config::ConfigError::Message(
                "jwt_auth_config.secret is not configured. Set it in the environment file or via LIBRARY_APP__JWT_AUTH_CONFIG__SECRET".to_string(),
            ));
        }
        if self.library.max_active_loans == 0 {
            return Err(config::ConfigError::Message(
                "library.max_active_loans must be at least 1".to_string(),
            ));
        }
        if self.library.daily_fine_rate.is_sign_negative() {
            return Err(config::ConfigError::Message(
                "library.daily_fine_rate cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Clone)]
pub struct LibraryWebServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mysql,
    Memory,
}

#[derive(Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Deserialize, Clone)]
pub struct MySqlConfig {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    #[serde(default)]
    pub run_migrations: bool,
}

impl MySqlConfig {
    pub fn connect(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .database(&self.database_name);

        options.log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Deserialize, Clone)]
pub struct JwtAuthConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_token_expiration_hours")]
    pub token_expiration_hours: i64,
}

/// Lending rules shared by every workflow.
#[derive(Deserialize, Clone, Debug)]
pub struct LibraryPolicy {
    #[serde(default = "default_daily_fine_rate")]
    pub daily_fine_rate: Decimal,
    #[serde(default = "default_max_active_loans")]
    pub max_active_loans: u32,
    #[serde(default = "default_loan_days")]
    pub default_loan_days: i64,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default = "default_fine_refresh_interval_secs")]
    pub fine_refresh_interval_secs: u64,
}

impl Default for LibraryPolicy {
    fn default() -> Self {
        Self {
            daily_fine_rate: default_daily_fine_rate(),
            max_active_loans: default_max_active_loans(),
            default_loan_days: default_loan_days(),
            admin_email: None,
            fine_refresh_interval_secs: default_fine_refresh_interval_secs(),
        }
    }
}

impl LibraryPolicy {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .map(|admin| admin.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    Api,
    Smtp,
}

#[derive(Deserialize, Clone)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub from_name: String,
    pub from_email: String,
    #[serde(default)]
    pub api: Option<EmailApiConfig>,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Deserialize, Clone)]
pub struct EmailApiConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local` or `production` ",
                other
            )),
        }
    }
}

fn default_token_expiration_hours() -> i64 {
    24
}

fn default_daily_fine_rate() -> Decimal {
    Decimal::from(10)
}

fn default_max_active_loans() -> u32 {
    3
}

fn default_loan_days() -> i64 {
    14
}

fn default_fine_refresh_interval_secs() -> u64 {
    3600
}

fn default_email_timeout_secs() -> u64 {
    10
}
