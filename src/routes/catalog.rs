use crate::core::change_feed::ChangeFeed;
use crate::core::jwt_auth::AdminUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::LibraryStore;
use crate::models::books::{BookFilter, BookPayload};
use crate::models::categories::CreateCategoryRequest;
use crate::models::pagination::PaginationQuery;
use crate::models::MessageResponse;
use crate::services::catalog;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;

#[tracing::instrument(name = "List Catalog Books", skip(store))]
#[get("/books")]
pub async fn list_books(
    store: web::Data<dyn LibraryStore>,
    filter: web::Query<BookFilter>,
    pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let (books, pagination_meta) = catalog::list_catalog(store.get_ref(), &filter, &pagination)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch books: {:?}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: books,
        message: "Books retrieved successfully".to_string(),
        pagination: Some(pagination_meta),
    }))
}

#[tracing::instrument(name = "Get Catalog Book", skip(store))]
#[get("/books/{book_id}")]
pub async fn get_book(
    store: web::Data<dyn LibraryStore>,
    book_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let book = catalog::get_catalog_book(store.get_ref(), book_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(book, "Book retrieved successfully")))
}

#[tracing::instrument(name = "Get Categories", skip(store))]
#[get("")]
pub async fn get_categories(store: web::Data<dyn LibraryStore>) -> Result<impl Responder, AppError> {
    let categories = catalog::list_categories(store.get_ref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        categories,
        "Categories retrieved successfully",
    )))
}

#[tracing::instrument(name = "Create Book", skip(store, feed, admin, payload))]
#[post("/books")]
pub async fn create_book(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    admin: AdminUser,
    payload: web::Json<BookPayload>,
) -> Result<impl Responder, AppError> {
    let book = catalog::create_book(store.get_ref(), feed.get_ref(), &payload, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create book: {:?}", e);
            e
        })?;
    tracing::info!(admin_id = admin.user_id, book_id = book.id, "book added");

    Ok(HttpResponse::Created().json(AppSuccessResponse::ok(book, "Book added successfully")))
}

#[tracing::instrument(name = "Update Book", skip(store, feed, _admin, payload))]
#[put("/books/{book_id}")]
pub async fn update_book(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    _admin: AdminUser,
    book_id: web::Path<i32>,
    payload: web::Json<BookPayload>,
) -> Result<impl Responder, AppError> {
    let book = catalog::update_book(store.get_ref(), feed.get_ref(), book_id.into_inner(), &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update book: {:?}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(book, "Book updated successfully")))
}

#[tracing::instrument(name = "Delete Book", skip(store, feed, _admin))]
#[delete("/books/{book_id}")]
pub async fn delete_book(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    _admin: AdminUser,
    book_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    catalog::delete_book(store.get_ref(), feed.get_ref(), book_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        MessageResponse {
            message: "Book deleted successfully".to_string(),
        },
        "Book deleted successfully",
    )))
}

#[tracing::instrument(name = "Create Category", skip(store, feed, _admin, payload))]
#[post("/categories")]
pub async fn create_category(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    _admin: AdminUser,
    payload: web::Json<CreateCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = catalog::create_category(store.get_ref(), feed.get_ref(), &payload).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::ok(
        category,
        "Category added successfully",
    )))
}
