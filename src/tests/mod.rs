//! API tests that drive the full router in-process.
//!
//! Every test builds its own [`TestApp`] over a fresh in-memory store, a
//! recording mailer and an in-memory avatar store.

mod admin_api_tests;
mod auth_api_tests;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt; // for .collect()
use serde_json::Value;
use tower::ServiceExt;

use crate::app::build_app;
use crate::auth::{password::hash_password, repo::NewUser, repo_types::{Role, User}};
use crate::config::AppConfig;
use crate::state::{AppState, Fakes};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub fakes: Fakes,
}

/// Registered account as seen by a test.
pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_fakes(AppState::fake())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::from_fakes(AppState::fake_with(config))
    }

    fn from_fakes((state, fakes): (AppState, Fakes)) -> Self {
        Self {
            router: build_app(state.clone()),
            state,
            fakes,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    pub async fn register(&self, name: &str, email: &str) -> Account {
        let (status, body) = self
            .post(
                "/api/register",
                None,
                serde_json::json!({ "name": name, "email": email, "password": "secret1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        account(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Creates an administrator directly in the store and logs in.
    pub async fn admin(&self) -> Account {
        User::create(
            &self.state.db,
            NewUser {
                email: "root@example.com".into(),
                password_hash: hash_password("rootpass").unwrap(),
                name: "Root".into(),
                role: Role::Admin,
                is_email_verified: true,
            },
        )
        .await
        .unwrap();
        let (status, body) = self.login("root@example.com", "rootpass").await;
        assert_eq!(status, StatusCode::OK);
        account(&body)
    }

    /// Adds a book to the caller's collection and returns its id.
    pub async fn add_book(&self, token: &str, name: &str, author: &str) -> String {
        let (status, body) = self
            .post(
                "/api/me/books",
                Some(token),
                serde_json::json!({ "name": name, "author": author }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add book: {body}");
        body["book"]["id"].as_str().unwrap().to_string()
    }
}

fn account(body: &Value) -> Account {
    Account {
        id: body["user"]["id"].as_str().unwrap().to_string(),
        email: body["user"]["email"].as_str().unwrap().to_string(),
        token: body["token"].as_str().unwrap().to_string(),
    }
}
