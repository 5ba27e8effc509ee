use crate::helpers::spawn_app;
use serde_json::{json, Value};

#[tokio::test]
async fn stats_count_the_whole_library() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "History").await;
    let lent = app.create_book(&admin, category, 2).await;
    app.create_book(&admin, category, 1).await;
    app.lend(&admin, &student, lent).await;

    let response = app.get("/admin/stats", Some(&admin.token)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total_books"], 2);
    assert_eq!(body["data"]["total_categories"], 1);
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["borrowed_count"], 1);
    let fees: f64 = body["data"]["total_fees"].as_str().unwrap().parse().unwrap();
    assert_eq!(fees, 0.0);
}

#[tokio::test]
async fn pending_queues_show_requester_and_copies() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "History").await;
    let requested = app.create_book(&admin, category, 2).await;
    let returning = app.create_book(&admin, category, 1).await;
    let loan = app.lend(&admin, &student, returning).await;
    app.request_book(&student, requested).await;
    app.post(
        "/student/returns",
        Some(&student.token),
        &json!({ "borrowed_book_id": loan }),
    )
    .await;

    let books: Value = app
        .get("/admin/book-requests", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    let returns: Value = app
        .get("/admin/return-requests", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(books["data"].as_array().unwrap().len(), 1);
    assert_eq!(books["data"][0]["book"]["id"], requested);
    assert_eq!(books["data"][0]["total_copies"], 2);
    assert_eq!(books["data"][0]["available_copies"], 2);
    assert!(books["data"][0]["requester_name"].is_string());

    assert_eq!(returns["data"].as_array().unwrap().len(), 1);
    assert_eq!(returns["data"][0]["borrowed_book_id"], loan);
    assert_eq!(returns["data"][0]["is_overdue"], false);
}

#[tokio::test]
async fn new_requests_raise_the_unread_counter_until_marked_read() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "History").await;
    let first = app.create_book(&admin, category, 1).await;
    let second = app.create_book(&admin, category, 1).await;
    app.request_book(&student, first).await;
    app.request_book(&student, second).await;

    let before: Value = app
        .get("/admin/notifications", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(before["data"]["unread"], 2);
    assert_eq!(before["data"]["pending_book_requests"], 2);
    assert_eq!(before["data"]["latest_book_requests"][0]["book"]["id"], second);

    let read: Value = app
        .post("/admin/notifications/read", Some(&admin.token), &json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(read["data"]["unread"], 0);
    assert_eq!(read["data"]["pending_book_requests"], 2);
}

#[tokio::test]
async fn refreshing_fines_leaves_loans_that_are_not_due_alone() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "History").await;
    let book = app.create_book(&admin, category, 1).await;
    app.lend(&admin, &student, book).await;

    let response = app
        .post("/admin/fines/refresh", Some(&admin.token), &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["updated"], 0);

    let loans: Value = app.get("/admin/loans", Some(&admin.token)).await.json().await.unwrap();
    assert_eq!(loans["data"].as_array().unwrap().len(), 1);
    assert_eq!(loans["data"][0]["user_id"], student.id);
    assert_eq!(loans["data"][0]["fine"]["days_overdue"], 0);
}

#[tokio::test]
async fn users_are_listed_without_password_hashes() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;

    let body: Value = app.get("/admin/users", Some(&admin.token)).await.json().await.unwrap();

    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["email"], student.email.as_str());
    assert_eq!(users[0]["role"], "student");
    assert_eq!(users[1]["role"], "admin");
    assert!(users.iter().all(|user| user.get("password_hash").is_none()));
}
