use actix_web::dev::Payload;
use actix_web::{http, web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::JwtAuthConfig;
use crate::core::AppError;
use crate::db::LibraryStore;
use crate::models::profiles::{Profile, Role};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // profile id
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }
}

/// Signing material built once from `jwt_auth_config`.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(config: &JwtAuthConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(config.token_expiration_hours),
        }
    }

    pub fn issue(
        &self,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.ttl;
        let claims = JwtClaims {
            sub: profile.id.to_string(),
            email: profile.email.clone(),
            role: profile.role,
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| AppError::internal_error("Failed to generate JWT token"))?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AppError> {
        decode::<JwtClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::unauthorized("Invalid token"))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid login credentials"))
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, AppError> {
    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| AppError::internal_error("JWT keys are not configured"))?;
    keys.verify(bearer_token(req)?)
}

impl FromRequest for JwtClaims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

/// Any signed-in profile.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub claims: JwtClaims,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| {
            Ok(AuthenticatedUser {
                user_id: claims.user_id()?,
                claims,
            })
        }))
    }
}

/// A signed-in profile whose role, looked up fresh from the store, is admin.
/// The role inside the token is not trusted on its own.
#[derive(Debug)]
pub struct AdminUser {
    pub user_id: i32,
    pub claims: JwtClaims,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = claims_from_request(req);
        let store = req.app_data::<web::Data<dyn LibraryStore>>().cloned();

        Box::pin(async move {
            let claims = claims?;
            let user_id = claims.user_id()?;
            let store =
                store.ok_or_else(|| AppError::internal_error("Library store is not configured"))?;

            match store.fetch_role(user_id).await? {
                Some(Role::Admin) => Ok(AdminUser { user_id, claims }),
                Some(_) => Err(AppError::forbidden_error(
                    "You do not have permission to access this resource",
                )),
                None => Err(AppError::unauthorized("Account no longer exists")),
            }
        })
    }
}
