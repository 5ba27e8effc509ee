use crate::helpers::{spawn_app, ADMIN_EMAIL, PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn register_returns_201_and_a_student_profile() {
    let app = spawn_app().await;

    let response = app.register("ada@example.com").await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["role"], "student");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_returns_400_for_invalid_payloads() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "full_name": "Ada", "email": "not-an-email", "password": PASSWORD }), "bad email"),
        (json!({ "full_name": "Ada", "email": "ada@example.com", "password": "123" }), "short password"),
        (json!({ "full_name": "  ", "email": "ada@example.com", "password": PASSWORD }), "blank name"),
    ];

    for (body, description) in test_cases {
        let response = app.post("/users/register", None, &body).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn registering_the_same_email_twice_is_a_conflict() {
    let app = spawn_app().await;
    app.register("twice@example.com").await;

    let response = app.register("twice@example.com").await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_redirects_each_role_to_its_dashboard() {
    let app = spawn_app().await;
    app.register("reader@example.com").await;
    app.register(ADMIN_EMAIL).await;

    let student: Value = app.login("reader@example.com", PASSWORD).await.json().await.unwrap();
    let admin: Value = app.login(ADMIN_EMAIL, PASSWORD).await.json().await.unwrap();

    assert_eq!(student["data"]["redirect_to"], "/student");
    assert_eq!(admin["data"]["redirect_to"], "/admin");
    assert_eq!(admin["data"]["user"]["role"], "admin");
}

#[tokio::test]
async fn login_with_a_wrong_password_is_rejected() {
    let app = spawn_app().await;
    app.register("reader@example.com").await;

    let response = app.login("reader@example.com", "not-the-password").await;

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email or password is incorrect");
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let app = spawn_app().await;
    let student = app.student().await;

    let anonymous = app.get("/users/profile", None).await;
    let forged = app.get("/users/profile", Some("not.a.jwt")).await;
    let signed_in = app.get("/users/profile", Some(&student.token)).await;

    assert_eq!(anonymous.status().as_u16(), 401);
    assert_eq!(forged.status().as_u16(), 401);
    assert_eq!(signed_in.status().as_u16(), 200);
    let body: Value = signed_in.json().await.unwrap();
    assert_eq!(body["data"]["email"], student.email.as_str());
}

#[tokio::test]
async fn students_cannot_reach_admin_endpoints() {
    let app = spawn_app().await;
    let student = app.student().await;

    let response = app.get("/admin/stats", Some(&student.token)).await;

    assert_eq!(response.status().as_u16(), 403);
}
