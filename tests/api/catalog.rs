use crate::helpers::spawn_app;
use serde_json::{json, Value};

#[tokio::test]
async fn catalog_is_public_and_paginated() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let category = app.create_category(&admin, "Drama").await;
    for _ in 0..3 {
        app.create_book(&admin, category, 2).await;
    }

    let response = app.get("/catalog/books?page=2&per_page=2", None).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["data"][0]["category_name"], "Drama");
    assert_eq!(body["data"][0]["status"], "Available");
}

#[tokio::test]
async fn a_page_far_past_the_end_is_empty_not_an_error() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let category = app.create_category(&admin, "Drama").await;
    app.create_book(&admin, category, 1).await;

    let response = app
        .get("/catalog/books?page=2147483647&per_page=100", None)
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total_items"], 1);
}

#[tokio::test]
async fn catalog_filters_by_category() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let drama = app.create_category(&admin, "Drama").await;
    let poetry = app.create_category(&admin, "Poetry").await;
    app.create_book(&admin, drama, 1).await;
    let poem = app.create_book(&admin, poetry, 1).await;

    let body: Value = app
        .get(&format!("/catalog/books?category_id={}", poetry), None)
        .await
        .json()
        .await
        .unwrap();

    let books = body["data"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], poem);
}

#[tokio::test]
async fn fully_lent_books_are_not_requestable() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let category = app.create_category(&admin, "Classics").await;
    let book = app.create_book(&admin, category, 2).await;
    let first = app.student().await;
    let second = app.student().await;
    let third = app.student().await;
    app.lend(&admin, &first, book).await;
    app.lend(&admin, &second, book).await;

    let body: Value = app
        .get("/student/books", Some(&third.token))
        .await
        .json()
        .await
        .unwrap();

    let entry = &body["data"][0];
    assert_eq!(entry["active_loans"], 2);
    assert_eq!(entry["available_copies"], 0);
    assert_eq!(entry["requestable"], false);
    assert_eq!(entry["blocked_reason"], "no_copies");
    assert_eq!(entry["status"], "Unavailable");
}

#[tokio::test]
async fn admins_can_update_and_delete_books() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let category = app.create_category(&admin, "Essays").await;
    let book = app.create_book(&admin, category, 4).await;

    let updated = app
        .put(
            &format!("/admin/books/{}", book),
            &admin.token,
            &json!({
                "title": "Ake: The Years of Childhood",
                "author": "Wole Soyinka",
                "isbn": "9780679725404",
                "category_id": category,
                "total_copies": 6,
                "cover_image": "https://covers.example.com/ake.jpg",
            }),
        )
        .await;
    assert_eq!(updated.status().as_u16(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["total_copies"], 6);

    let deleted = app.delete(&format!("/admin/books/{}", book), &admin.token).await;
    assert_eq!(deleted.status().as_u16(), 200);

    let missing = app.get(&format!("/catalog/books/{}", book), None).await;
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn invalid_books_are_rejected() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let category = app.create_category(&admin, "Essays").await;

    let response = app
        .post(
            "/admin/books",
            Some(&admin.token),
            &json!({
                "title": "Zero copies",
                "author": "Nobody",
                "isbn": "1",
                "category_id": category,
                "total_copies": 0,
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn category_names_are_unique_and_listed_publicly() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    app.create_category(&admin, "History").await;

    let duplicate = app
        .post("/admin/categories", Some(&admin.token), &json!({ "name": "History" }))
        .await;
    assert_eq!(duplicate.status().as_u16(), 409);

    let body: Value = app.get("/categories", None).await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "History");
}
