use crate::helpers::spawn_app;
use serde_json::{json, Value};

fn decimal(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn an_on_time_return_closes_the_loan_without_a_fine() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Poetry").await;
    let book = app.create_book(&admin, category, 1).await;
    let loan = app.lend(&admin, &student, book).await;

    let response = app
        .post(
            "/student/returns",
            Some(&student.token),
            &json!({ "borrowed_book_id": loan }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let request: Value = response.json().await.unwrap();
    assert_eq!(request["data"]["status"], "Pending");

    let approved = app
        .post(
            &format!(
                "/admin/return-requests/{}/approve",
                request["data"]["id"].as_i64().unwrap()
            ),
            Some(&admin.token),
            &json!({}),
        )
        .await;
    assert_eq!(approved.status().as_u16(), 200);
    let approval: Value = approved.json().await.unwrap();
    assert_eq!(approval["data"]["request"]["status"], "Approved");
    assert_eq!(decimal(&approval["data"]["fine_charged"]), 0.0);
    assert_eq!(approval["data"]["days_overdue"], 0);
    assert_eq!(approval["message"], "Return approved successfully");

    let loans: Value = app.get("/student/loans", Some(&student.token)).await.json().await.unwrap();
    assert!(loans["data"].as_array().unwrap().is_empty());

    let catalog_book: Value = app
        .get(&format!("/catalog/books/{}", book), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(catalog_book["data"]["available_copies"], 1);
    assert_eq!(catalog_book["data"]["status"], "Available");
}

#[tokio::test]
async fn a_second_pending_return_for_the_same_loan_is_a_conflict() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Poetry").await;
    let book = app.create_book(&admin, category, 1).await;
    let loan = app.lend(&admin, &student, book).await;
    let body = json!({ "borrowed_book_id": loan });

    let first = app.post("/student/returns", Some(&student.token), &body).await;
    let second = app.post("/student/returns", Some(&student.token), &body).await;

    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn students_cannot_return_someone_elses_loan() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let owner = app.student().await;
    let stranger = app.student().await;
    let category = app.create_category(&admin, "Poetry").await;
    let book = app.create_book(&admin, category, 1).await;
    let loan = app.lend(&admin, &owner, book).await;

    let response = app
        .post(
            "/student/returns",
            Some(&stranger.token),
            &json!({ "borrowed_book_id": loan }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn a_declined_return_keeps_the_loan_open() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.student().await;
    let category = app.create_category(&admin, "Poetry").await;
    let book = app.create_book(&admin, category, 1).await;
    let loan = app.lend(&admin, &student, book).await;
    let request: Value = app
        .post(
            "/student/returns",
            Some(&student.token),
            &json!({ "borrowed_book_id": loan }),
        )
        .await
        .json()
        .await
        .unwrap();

    let declined = app
        .post(
            &format!(
                "/admin/return-requests/{}/decline",
                request["data"]["id"].as_i64().unwrap()
            ),
            Some(&admin.token),
            &json!({}),
        )
        .await;
    assert_eq!(declined.status().as_u16(), 200);

    let loans: Value = app.get("/student/loans", Some(&student.token)).await.json().await.unwrap();
    assert_eq!(loans["data"][0]["id"], loan);

    let history: Value = app
        .get("/student/returns", Some(&student.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history["data"][0]["status"], "Declined");

    let again = app
        .post(
            "/student/returns",
            Some(&student.token),
            &json!({ "borrowed_book_id": loan }),
        )
        .await;
    assert_eq!(again.status().as_u16(), 201);
}
