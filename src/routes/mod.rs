use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use admin::{
    approve_book_request, approve_return_request, decline_book_request, decline_return_request,
    get_active_loans, get_notifications, get_pending_book_requests, get_pending_return_requests,
    get_stats, get_users, mark_notifications_read, refresh_overdue_fines,
};
use catalog::{create_book, create_category, delete_book, get_book, get_categories, list_books, update_book};
use reminders::send_reminder;
use student::{
    create_book_request, create_return_request, get_my_book_requests, get_my_loans,
    get_my_return_requests, list_student_books,
};
use users::{get_profile, login, register};

mod admin;
mod catalog;
mod health_check;
mod reminders;
mod student;
mod users;

use crate::routes::health_check::*;

fn util_routes() -> Scope {
    scope("").service(health_check)
}

fn users_routes() -> Scope {
    scope("users")
        .service(register)
        .service(login)
        .service(get_profile)
}

fn catalog_routes() -> Scope {
    scope("catalog").service(list_books).service(get_book)
}

fn categories_routes() -> Scope {
    scope("categories").service(get_categories)
}

fn student_routes() -> Scope {
    scope("student")
        .service(list_student_books)
        .service(get_my_book_requests)
        .service(create_book_request)
        .service(get_my_loans)
        .service(get_my_return_requests)
        .service(create_return_request)
}

fn admin_routes() -> Scope {
    scope("admin")
        .service(get_stats)
        .service(get_users)
        .service(get_active_loans)
        .service(refresh_overdue_fines)
        // borrow queue
        .service(get_pending_book_requests)
        .service(approve_book_request)
        .service(decline_book_request)
        // return queue
        .service(get_pending_return_requests)
        .service(approve_return_request)
        .service(decline_return_request)
        .service(get_notifications)
        .service(mark_notifications_read)
        // inventory
        .service(create_book)
        .service(update_book)
        .service(delete_book)
        .service(create_category)
}

fn reminders_routes() -> Scope {
    scope("reminders").service(send_reminder)
}

pub fn library_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(users_routes())
            .service(catalog_routes())
            .service(categories_routes())
            .service(student_routes())
            .service(admin_routes())
            .service(reminders_routes())
            .service(util_routes()),
    );
}
