use crate::core::change_feed::ChangeFeed;
use crate::core::config::LibraryPolicy;
use crate::core::jwt_auth::{AuthenticatedUser, JwtKeys};
use crate::core::{AppError, AppSuccessResponse};
use crate::db::LibraryStore;
use crate::models::profiles::{LoginRequest, RegisterRequest};
use crate::services::accounts;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;

#[tracing::instrument(name = "Register User", skip(store, feed, policy, request))]
#[post("/register")]
pub async fn register(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    policy: web::Data<LibraryPolicy>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::register(
        store.get_ref(),
        feed.get_ref(),
        policy.get_ref(),
        &request,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to register user: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::ok(
        profile,
        "User registered successfully",
    )))
}

#[tracing::instrument(name = "User Login", skip(store, feed, policy, keys, request))]
#[post("/login")]
pub async fn login(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    policy: web::Data<LibraryPolicy>,
    keys: web::Data<JwtKeys>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = accounts::login(
        store.get_ref(),
        feed.get_ref(),
        policy.get_ref(),
        keys.get_ref(),
        &request,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(response, "Login successful")))
}

#[tracing::instrument(name = "Get User Profile", skip(store, user))]
#[get("/profile")]
pub async fn get_profile(
    store: web::Data<dyn LibraryStore>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::profile(store.get_ref(), user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        profile,
        "Profile retrieved successfully",
    )))
}
