use std::path::PathBuf;
use std::sync::Arc;

use account_service::config::CookieConfig;
use account_service::domain::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::media::LocalMediaStore;
use account_service::outbound::repositories::InMemoryUserRepository;
use auth::Authenticator;
use auth::TokenService;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde_json::json;
use serde_json::Value;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-for-jwt-signing-32-bytes";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-for-jwt-signing-32-bytes";
pub const MEDIA_BASE_URL: &str = "http://media.test/uploads";

pub const REGISTER: &str = "/api/v1/users/register";
pub const LOGIN: &str = "/api/v1/users/login";
pub const LOGOUT: &str = "/api/v1/users/logout";
pub const REFRESH: &str = "/api/v1/users/refresh-token";
pub const CURRENT_USER: &str = "/api/v1/users/current-user";

/// Test application that spawns a real server over an in-memory store
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    /// Token service sharing the server's secrets
    pub tokens: TokenService,
    media_directory: PathBuf,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let media_directory = std::env::temp_dir().join(format!(
            "account-service-test-{}",
            uuid::Uuid::new_v4()
        ));

        let repository = Arc::new(InMemoryUserRepository::new());
        let media_store = Arc::new(LocalMediaStore::new(&media_directory, MEDIA_BASE_URL));
        let authenticator = Arc::new(Authenticator::new(TokenService::new(
            ACCESS_SECRET,
            REFRESH_SECRET,
        )));
        let account_service = Arc::new(AccountService::new(
            repository,
            media_store,
            authenticator,
        ));

        let router = create_router(account_service, CookieConfig::default());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            // Secure cookies are never replayed over plain http, so tests
            // pass them explicitly instead of relying on a cookie store
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            tokens: TokenService::new(ACCESS_SECRET, REFRESH_SECRET),
            media_directory,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request carrying a single cookie
    pub fn post_with_cookie(&self, path: &str, name: &str, value: &str) -> reqwest::RequestBuilder {
        self.post(path)
            .header(reqwest::header::COOKIE, format!("{}={}", name, value))
    }

    /// Register form with every required field and an avatar
    pub fn registration_form(username: &str, email: &str, password: &str) -> Form {
        Form::new()
            .text("fullName", "Test User")
            .text("userName", username.to_string())
            .text("email", email.to_string())
            .text("password", password.to_string())
            .part("avatar", image_part("avatar.png"))
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.post(REGISTER)
            .multipart(Self::registration_form(username, email, password))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post(LOGIN)
            .json(&json!({ "userName": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register `username` and log in, returning the login response body
    pub async fn register_and_login(&self, username: &str, password: &str) -> Value {
        let email = format!("{}@example.com", username);
        let response = self.register(username, &email, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let response = self.login(username, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_directory);
    }
}

pub fn image_part(file_name: &str) -> Part {
    Part::bytes(vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a])
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to build multipart part")
}

/// Value of the `name` cookie set by `response`, if any
pub fn set_cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}
