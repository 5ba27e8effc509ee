use crate::core::change_feed::ChangeFeed;
use crate::core::config::LibraryPolicy;
use crate::core::jwt_auth::AuthenticatedUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::LibraryStore;
use crate::models::book_requests::CreateBookRequest;
use crate::models::books::BookFilter;
use crate::models::pagination::PaginationQuery;
use crate::models::return_requests::CreateReturnRequest;
use crate::services::{borrowing, catalog, returns, student};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;

#[tracing::instrument(name = "List Books For Student", skip(store, policy, user))]
#[get("/books")]
pub async fn list_student_books(
    store: web::Data<dyn LibraryStore>,
    policy: web::Data<LibraryPolicy>,
    user: AuthenticatedUser,
    filter: web::Query<BookFilter>,
    pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let (books, pagination_meta) = catalog::list_catalog_for_student(
        store.get_ref(),
        policy.get_ref(),
        user.user_id,
        &filter,
        &pagination,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch books for student {}: {:?}", user.user_id, e);
        e
    })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: books,
        message: "Books retrieved successfully".to_string(),
        pagination: Some(pagination_meta),
    }))
}

#[tracing::instrument(name = "Get My Book Requests", skip(store, user))]
#[get("/requests")]
pub async fn get_my_book_requests(
    store: web::Data<dyn LibraryStore>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let requests = student::my_book_requests(store.get_ref(), user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        requests,
        "Book requests retrieved successfully",
    )))
}

#[tracing::instrument(name = "Request Book", skip(store, feed, policy, user))]
#[post("/requests")]
pub async fn create_book_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    policy: web::Data<LibraryPolicy>,
    user: AuthenticatedUser,
    request: web::Json<CreateBookRequest>,
) -> Result<impl Responder, AppError> {
    let created = borrowing::request_book(
        store.get_ref(),
        feed.get_ref(),
        policy.get_ref(),
        user.user_id,
        request.book_id,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create book request: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::ok(
        created,
        "Book request submitted successfully",
    )))
}

#[tracing::instrument(name = "Get My Loans", skip(store, user))]
#[get("/loans")]
pub async fn get_my_loans(
    store: web::Data<dyn LibraryStore>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let loans = student::my_active_loans(store.get_ref(), user.user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        loans,
        "Borrowed books retrieved successfully",
    )))
}

#[tracing::instrument(name = "Get My Return Requests", skip(store, user))]
#[get("/returns")]
pub async fn get_my_return_requests(
    store: web::Data<dyn LibraryStore>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let requests = student::my_return_requests(store.get_ref(), user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        requests,
        "Return requests retrieved successfully",
    )))
}

#[tracing::instrument(name = "Request Return", skip(store, feed, user))]
#[post("/returns")]
pub async fn create_return_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    user: AuthenticatedUser,
    request: web::Json<CreateReturnRequest>,
) -> Result<impl Responder, AppError> {
    let created = returns::request_return(
        store.get_ref(),
        feed.get_ref(),
        user.user_id,
        request.borrowed_book_id,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create return request: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::ok(
        created,
        "Return request submitted successfully",
    )))
}
