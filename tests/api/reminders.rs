use crate::helpers::spawn_app;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn reminder() -> Value {
    json!({
        "email": "reader@library.test",
        "userName": "Amina Yusuf",
        "bookTitle": "Things Fall Apart",
        "dueDate": "2024-03-15T00:00:00Z",
        "daysRemaining": 2,
    })
}

#[tokio::test]
async fn send_reminder_passes_the_provider_reply_through() {
    let app = spawn_app().await;
    let student = app.student().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email-123" })))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post("/reminders/send-reminder", Some(&student.token), &reminder())
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "id": "email-123" }));

    let received = app.email_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(sent["to"], json!(["reader@library.test"]));
    assert_eq!(sent["subject"], "📚 Book Due Reminder: Things Fall Apart");
    assert!(sent["html"].as_str().unwrap().contains("March 15, 2024"));
}

#[tokio::test]
async fn provider_errors_come_back_as_500() {
    let app = spawn_app().await;
    let student = app.student().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid `to` field" })),
        )
        .mount(&app.email_server)
        .await;

    let response = app
        .post("/reminders/send-reminder", Some(&student.token), &reminder())
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid `to` field");
}

#[tokio::test]
async fn send_reminder_rejects_a_bad_address_before_calling_out() {
    let app = spawn_app().await;
    let student = app.student().await;
    let mut payload = reminder();
    payload["email"] = json!("not-an-address");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post("/reminders/send-reminder", Some(&student.token), &payload)
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn send_reminder_requires_a_token() {
    let app = spawn_app().await;

    let response = app.post("/reminders/send-reminder", None, &reminder()).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn markup_in_the_reminder_fields_is_escaped() {
    let app = spawn_app().await;
    let student = app.student().await;
    let mut payload = reminder();
    payload["userName"] = json!(r#"<a href="http://evil.test">Click to pay your fine</a>"#);

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email-456" })))
        .mount(&app.email_server)
        .await;

    let response = app
        .post("/reminders/send-reminder", Some(&student.token), &payload)
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let received = app.email_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    let html = sent["html"].as_str().unwrap();
    assert!(!html.contains("<a href"));
    assert!(html.contains("&lt;a href="));
}
