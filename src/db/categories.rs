use crate::core::AppError;
use crate::models::categories::Category;
use sqlx::MySqlPool;

pub async fn fetch_categories(pool: &MySqlPool) -> Result<Vec<Category>, AppError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT id, name FROM tbl_categories ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(AppError::db_error)?;

    Ok(categories)
}

pub async fn fetch_category_by_id(
    pool: &MySqlPool,
    category_id: i32,
) -> Result<Option<Category>, AppError> {
    let category = sqlx::query_as::<_, Category>("SELECT id, name FROM tbl_categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(category)
}

pub async fn fetch_category_by_name(
    pool: &MySqlPool,
    name: &str,
) -> Result<Option<Category>, AppError> {
    let category =
        sqlx::query_as::<_, Category>("SELECT id, name FROM tbl_categories WHERE LOWER(name) = LOWER(?)")
            .bind(name)
            .fetch_optional(pool)
            .await
            .map_err(AppError::db_error)?;

    Ok(category)
}

pub async fn insert_category(pool: &MySqlPool, name: &str) -> Result<Category, AppError> {
    let result = sqlx::query("INSERT INTO tbl_categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(Category {
        id: result.last_insert_id() as i32,
        name: name.to_string(),
    })
}

pub async fn count_categories(pool: &MySqlPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_categories")
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(count)
}
