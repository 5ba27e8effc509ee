use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::core::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::core::config::LibraryPolicy;
use crate::core::jwt_auth::JwtKeys;
use crate::core::{AppError, AppErrorType};
use crate::db::LibraryStore;
use crate::models::profiles::{
    LoginRequest, LoginResponse, NewProfile, ProfileResponse, RegisterRequest, Role,
};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError {
            message: Some("Failed to hash password".to_string()),
            cause: None,
            error_type: AppErrorType::HashingFailed,
        })
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::internal_error("Invalid password hash"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Creates a student profile, or an admin one for the configured admin email.
pub async fn register(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    policy: &LibraryPolicy,
    request: &RegisterRequest,
    now: DateTime<Utc>,
) -> Result<ProfileResponse, AppError> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    if store.get_profile_by_email(&email).await?.is_some() {
        return Err(AppError::conflict(
            "A user with this email address already exists",
        ));
    }

    let role = if policy.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::Student
    };

    let profile = store
        .create_profile(&NewProfile {
            full_name: request.full_name.trim().to_string(),
            email,
            role,
            password_hash: hash_password(&request.password)?,
            created_at: now,
        })
        .await?;

    tracing::info!(user_id = profile.id, role = role.as_str(), "profile registered");
    feed.publish(ChangeEvent::new(Table::Profiles, ChangeKind::Insert, profile.id));
    Ok(ProfileResponse::from(profile))
}

pub async fn login(
    store: &dyn LibraryStore,
    feed: &dyn ChangeFeed,
    policy: &LibraryPolicy,
    keys: &JwtKeys,
    request: &LoginRequest,
    now: DateTime<Utc>,
) -> Result<LoginResponse, AppError> {
    request.validate()?;
    let invalid = || AppError::unauthorized("Email or password is incorrect");

    let mut profile = store
        .get_profile_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&request.password, &profile.password_hash)? {
        return Err(invalid());
    }

    // the configured admin keeps admin rights even if the row was created earlier
    if profile.role != Role::Admin && policy.is_admin_email(&profile.email) {
        store.set_profile_role(profile.id, Role::Admin).await?;
        profile.role = Role::Admin;
        feed.publish(ChangeEvent::new(Table::Profiles, ChangeKind::Update, profile.id));
    }

    let (token, expires_at) = keys.issue(&profile, now)?;
    let redirect_to = profile.role.landing_path().to_string();

    Ok(LoginResponse {
        user: ProfileResponse::from(profile),
        token,
        expires_at,
        redirect_to,
    })
}

pub async fn profile(store: &dyn LibraryStore, user_id: i32) -> Result<ProfileResponse, AppError> {
    store
        .get_profile(user_id)
        .await?
        .map(ProfileResponse::from)
        .ok_or_else(|| AppError::not_found("Profile not found"))
}
