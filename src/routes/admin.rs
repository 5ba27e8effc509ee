use crate::core::change_feed::ChangeFeed;
use crate::core::config::LibraryPolicy;
use crate::core::jwt_auth::AdminUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::LibraryStore;
use crate::models::book_requests::ApproveBookRequest;
use crate::services::notifications::notification_summary;
use crate::services::{admin, borrowing, returns, AdminNotifications};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;

#[tracing::instrument(name = "Get Library Stats", skip(store, _admin))]
#[get("/stats")]
pub async fn get_stats(
    store: web::Data<dyn LibraryStore>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let stats = admin::library_stats(store.get_ref(), Utc::now())
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute library stats: {:?}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(stats, "Stats retrieved successfully")))
}

#[tracing::instrument(name = "Get Users", skip(store, _admin))]
#[get("/users")]
pub async fn get_users(
    store: web::Data<dyn LibraryStore>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let users = admin::list_users(store.get_ref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(users, "Users retrieved successfully")))
}

#[tracing::instrument(name = "Get Active Loans", skip(store, _admin))]
#[get("/loans")]
pub async fn get_active_loans(
    store: web::Data<dyn LibraryStore>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let loans = admin::active_loans(store.get_ref(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        loans,
        "Borrowed books retrieved successfully",
    )))
}

#[tracing::instrument(name = "Refresh Overdue Fines", skip(store, feed, admin))]
#[post("/fines/refresh")]
pub async fn refresh_overdue_fines(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let summary = admin::refresh_fines(store.get_ref(), feed.get_ref(), Utc::now())
        .await
        .map_err(|e| {
            tracing::error!("Failed to refresh fines: {:?}", e);
            e
        })?;
    tracing::info!(admin_id = admin.user_id, updated = summary.updated, "fines refreshed on demand");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(summary, "Fines updated successfully")))
}

#[tracing::instrument(name = "Get Pending Book Requests", skip(store, _admin))]
#[get("/book-requests")]
pub async fn get_pending_book_requests(
    store: web::Data<dyn LibraryStore>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let requests = admin::pending_book_requests(store.get_ref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        requests,
        "Pending book requests retrieved successfully",
    )))
}

#[tracing::instrument(name = "Approve Book Request", skip(store, feed, policy, admin, body))]
#[post("/book-requests/{request_id}/approve")]
pub async fn approve_book_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    policy: web::Data<LibraryPolicy>,
    admin: AdminUser,
    request_id: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let due_date = ApproveBookRequest::from_body(&body)?.due_date;
    let loan = borrowing::approve_request(
        store.get_ref(),
        feed.get_ref(),
        policy.get_ref(),
        request_id.into_inner(),
        admin.user_id,
        due_date,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to approve book request: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        loan,
        "Book request approved successfully",
    )))
}

#[tracing::instrument(name = "Decline Book Request", skip(store, feed, admin))]
#[post("/book-requests/{request_id}/decline")]
pub async fn decline_book_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    admin: AdminUser,
    request_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let request = borrowing::decline_request(
        store.get_ref(),
        feed.get_ref(),
        request_id.into_inner(),
        admin.user_id,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        request,
        "Book request declined successfully",
    )))
}

#[tracing::instrument(name = "Get Pending Return Requests", skip(store, _admin))]
#[get("/return-requests")]
pub async fn get_pending_return_requests(
    store: web::Data<dyn LibraryStore>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let requests = admin::pending_return_requests(store.get_ref(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        requests,
        "Pending return requests retrieved successfully",
    )))
}

#[tracing::instrument(name = "Approve Return Request", skip(store, feed, admin))]
#[post("/return-requests/{request_id}/approve")]
pub async fn approve_return_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    admin: AdminUser,
    request_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let approval = returns::approve_return(
        store.get_ref(),
        feed.get_ref(),
        request_id.into_inner(),
        admin.user_id,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to approve return request: {:?}", e);
        e
    })?;

    let message = if approval.fine_charged.is_zero() {
        "Return approved successfully".to_string()
    } else {
        format!("Return approved with a fine of {}", approval.fine_charged)
    };
    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(approval, message)))
}

#[tracing::instrument(name = "Decline Return Request", skip(store, feed, admin))]
#[post("/return-requests/{request_id}/decline")]
pub async fn decline_return_request(
    store: web::Data<dyn LibraryStore>,
    feed: web::Data<dyn ChangeFeed>,
    admin: AdminUser,
    request_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let request = returns::decline_return(
        store.get_ref(),
        feed.get_ref(),
        request_id.into_inner(),
        admin.user_id,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        request,
        "Return request declined successfully",
    )))
}

#[tracing::instrument(name = "Get Admin Notifications", skip(store, notifications, _admin))]
#[get("/notifications")]
pub async fn get_notifications(
    store: web::Data<dyn LibraryStore>,
    notifications: web::Data<AdminNotifications>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let summary = notification_summary(store.get_ref(), notifications.get_ref(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        summary,
        "Notifications retrieved successfully",
    )))
}

#[tracing::instrument(name = "Mark Notifications Read", skip(store, notifications, _admin))]
#[post("/notifications/read")]
pub async fn mark_notifications_read(
    store: web::Data<dyn LibraryStore>,
    notifications: web::Data<AdminNotifications>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let cleared = notifications.mark_read();
    let summary = notification_summary(store.get_ref(), notifications.get_ref(), Utc::now()).await?;
    tracing::info!(cleared, "admin notifications marked as read");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::ok(
        summary,
        "Notifications marked as read",
    )))
}
