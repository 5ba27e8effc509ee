use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use library_portal::core::config::StorageBackend;
use library_portal::core::{get_subscriber, init_subscriber, AppConfig};
use library_portal::library_web_server::LibraryWebServer;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const ADMIN_EMAIL: &str = "librarian@library.test";
pub const PASSWORD: &str = "open-sesame";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub email_server: MockServer,
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> reqwest::Response {
        let mut request = self.api_client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.api_client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, email: &str) -> reqwest::Response {
        let full_name: String = Name().fake();
        self.post(
            "/users/register",
            None,
            &json!({ "full_name": full_name, "email": email, "password": PASSWORD }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post(
            "/users/login",
            None,
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn signed_in(&self, email: String) -> TestUser {
        let registered: Value = self.register(&email).await.json().await.unwrap();
        let logged_in: Value = self.login(&email, PASSWORD).await.json().await.unwrap();
        TestUser {
            id: registered["data"]["id"].as_i64().unwrap(),
            email,
            token: logged_in["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn student(&self) -> TestUser {
        let email: String = SafeEmail().fake();
        self.signed_in(format!("{}.{}", uuid::Uuid::new_v4().simple(), email).to_lowercase())
            .await
    }

    pub async fn admin(&self) -> TestUser {
        self.signed_in(ADMIN_EMAIL.to_string()).await
    }

    pub async fn create_category(&self, admin: &TestUser, name: &str) -> i64 {
        let response = self
            .post("/admin/categories", Some(&admin.token), &json!({ "name": name }))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_book(&self, admin: &TestUser, category_id: i64, total_copies: i32) -> i64 {
        let response = self
            .post(
                "/admin/books",
                Some(&admin.token),
                &json!({
                    "title": format!("Book {}", uuid::Uuid::new_v4().simple()),
                    "author": "Wole Soyinka",
                    "isbn": "9780413570606",
                    "category_id": category_id,
                    "total_copies": total_copies,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn request_book(&self, student: &TestUser, book_id: i64) -> reqwest::Response {
        self.post(
            "/student/requests",
            Some(&student.token),
            &json!({ "book_id": book_id }),
        )
        .await
    }

    /// Requests and approves a loan, returning the loan id.
    pub async fn lend(&self, admin: &TestUser, student: &TestUser, book_id: i64) -> i64 {
        let request: Value = self.request_book(student, book_id).await.json().await.unwrap();
        let request_id = request["data"]["id"].as_i64().unwrap();
        let loan: Value = self
            .post(
                &format!("/admin/book-requests/{}/approve", request_id),
                Some(&admin.token),
                &json!({}),
            )
            .await
            .json()
            .await
            .unwrap();
        loan["data"]["id"].as_i64().unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = AppConfig::new().expect("Failed to read configuration.");
        c.library_server_config.host = "127.0.0.1".to_string();
        c.library_server_config.port = 0;
        c.storage.backend = StorageBackend::Memory;
        c.library.admin_email = Some(ADMIN_EMAIL.to_string());
        c.library.fine_refresh_interval_secs = 0;
        if let Some(api) = c.email.api.as_mut() {
            api.base_url = email_server.uri();
        }
        c
    };

    let application = LibraryWebServer::build(configuration)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        api_client: reqwest::Client::new(),
        email_server,
    }
}
