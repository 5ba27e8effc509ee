use crate::helpers::spawn_app;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

#[tokio::test]
async fn approving_a_request_opens_a_fourteen_day_loan() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 3).await;

    let request: Value = app.request_book(&student, book).await.json().await.unwrap();
    assert_eq!(request["data"]["status"], "Pending");
    let request_id = request["data"]["id"].as_i64().unwrap();

    let response = app
        .post(
            &format!("/admin/book-requests/{}/approve", request_id),
            Some(&admin.token),
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let loan: Value = response.json().await.unwrap();
    let issued: DateTime<Utc> = serde_json::from_value(loan["data"]["issue_date"].clone()).unwrap();
    let due: DateTime<Utc> = serde_json::from_value(loan["data"]["due_date"].clone()).unwrap();
    assert_eq!(due - issued, Duration::days(14));
    assert_eq!(loan["data"]["user_id"], student.id);
    assert_eq!(loan["data"]["fee_paid"], false);

    let mine: Value = app.get("/student/loans", Some(&student.token)).await.json().await.unwrap();
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    assert_eq!(mine["data"][0]["days_remaining"], 14);
    assert_eq!(mine["data"][0]["fine"]["is_overdue"], false);
}

#[tokio::test]
async fn approving_with_no_copies_left_is_rejected_without_a_loan() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let first = app.student().await;
    let second = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 1).await;

    let waiting: Value = app.request_book(&second, book).await.json().await.unwrap();
    app.lend(&admin, &first, book).await;

    let response = app
        .post(
            &format!(
                "/admin/book-requests/{}/approve",
                waiting["data"]["id"].as_i64().unwrap()
            ),
            Some(&admin.token),
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 409);
    let loans: Value = app.get("/student/loans", Some(&second.token)).await.json().await.unwrap();
    assert!(loans["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn requesting_an_unavailable_book_is_a_conflict() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let first = app.student().await;
    let second = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 1).await;
    app.lend(&admin, &first, book).await;

    let response = app.request_book(&second, book).await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn a_fourth_loan_is_refused() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    for _ in 0..3 {
        let book = app.create_book(&admin, category, 2).await;
        app.lend(&admin, &student, book).await;
    }
    let book = app.create_book(&admin, category, 2).await;

    let response = app.request_book(&student, book).await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You can only borrow up to 3 books at a time");
}

#[tokio::test]
async fn declined_requests_show_up_in_the_student_history() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 2).await;
    let request: Value = app.request_book(&student, book).await.json().await.unwrap();
    let request_id = request["data"]["id"].as_i64().unwrap();

    let declined = app
        .post(
            &format!("/admin/book-requests/{}/decline", request_id),
            Some(&admin.token),
            &json!({}),
        )
        .await;
    assert_eq!(declined.status().as_u16(), 200);

    let again = app
        .post(
            &format!("/admin/book-requests/{}/approve", request_id),
            Some(&admin.token),
            &json!({}),
        )
        .await;
    assert_eq!(again.status().as_u16(), 409);

    let history: Value = app
        .get("/student/requests", Some(&student.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history["data"][0]["status"], "Declined");
    assert_eq!(history["data"][0]["book"]["id"], book);
}

#[tokio::test]
async fn custom_due_dates_are_honoured() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 2).await;
    let request: Value = app.request_book(&student, book).await.json().await.unwrap();
    let due = (Utc::now() + Duration::days(3)).to_rfc3339();

    let loan: Value = app
        .post(
            &format!(
                "/admin/book-requests/{}/approve",
                request["data"]["id"].as_i64().unwrap()
            ),
            Some(&admin.token),
            &json!({ "due_date": due }),
        )
        .await
        .json()
        .await
        .unwrap();

    let stored: DateTime<Utc> = serde_json::from_value(loan["data"]["due_date"].clone()).unwrap();
    let expected: DateTime<Utc> = due.parse().unwrap();
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn date_only_due_dates_are_honoured() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 2).await;
    let request: Value = app.request_book(&student, book).await.json().await.unwrap();
    let due_day = (Utc::now() + Duration::days(30)).date_naive();

    let response = app
        .post(
            &format!(
                "/admin/book-requests/{}/approve",
                request["data"]["id"].as_i64().unwrap()
            ),
            Some(&admin.token),
            &json!({ "due_date": due_day.format("%Y-%m-%d").to_string() }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let loan: Value = response.json().await.unwrap();
    let stored: DateTime<Utc> = serde_json::from_value(loan["data"]["due_date"].clone()).unwrap();
    assert_eq!(stored.date_naive(), due_day);
    assert_eq!(stored.format("%H:%M:%S").to_string(), "00:00:00");
}

#[tokio::test]
async fn malformed_due_dates_are_rejected_without_a_loan() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, category, 2).await;
    let request: Value = app.request_book(&student, book).await.json().await.unwrap();
    let request_id = request["data"]["id"].as_i64().unwrap();

    let response = app
        .post(
            &format!("/admin/book-requests/{}/approve", request_id),
            Some(&admin.token),
            &json!({ "due_date": "next tuesday" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let loans: Value = app.get("/student/loans", Some(&student.token)).await.json().await.unwrap();
    assert!(loans["data"].as_array().unwrap().is_empty());
    let pending: Value = app
        .get("/admin/book-requests", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending["data"][0]["id"], request_id);
}
