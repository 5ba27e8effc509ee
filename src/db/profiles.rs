use crate::core::AppError;
use crate::models::profiles::{NewProfile, Profile, Role};
use sqlx::MySqlPool;

const PROFILE_COLUMNS: &str = "id, full_name, email, role, password_hash, created_at";

pub async fn insert_profile(pool: &MySqlPool, profile: &NewProfile) -> Result<Profile, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_profiles (full_name, email, role, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(profile.role.as_str())
    .bind(&profile.password_hash)
    .bind(profile.created_at)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let user_id = result.last_insert_id() as i32;
    fetch_profile_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted profile could not be read back"))
}

pub async fn fetch_profile_by_id(
    pool: &MySqlPool,
    user_id: i32,
) -> Result<Option<Profile>, AppError> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM tbl_profiles WHERE id = ?",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(profile)
}

pub async fn fetch_profile_by_email(
    pool: &MySqlPool,
    email: &str,
) -> Result<Option<Profile>, AppError> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM tbl_profiles WHERE LOWER(email) = LOWER(?)",
        PROFILE_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(profile)
}

pub async fn fetch_profiles(pool: &MySqlPool) -> Result<Vec<Profile>, AppError> {
    let profiles = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM tbl_profiles ORDER BY created_at DESC",
        PROFILE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(profiles)
}

pub async fn count_profiles(pool: &MySqlPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_profiles")
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(count)
}

pub async fn fetch_role(pool: &MySqlPool, user_id: i32) -> Result<Option<Role>, AppError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM tbl_profiles WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)?;

    role.map(|role| role.parse::<Role>().map_err(AppError::internal_error))
        .transpose()
}

pub async fn update_role(pool: &MySqlPool, user_id: i32, role: Role) -> Result<(), AppError> {
    sqlx::query("UPDATE tbl_profiles SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(())
}
