use axum::http::StatusCode;
use serde_json::json;

use super::TestApp;

#[tokio::test]
async fn register_then_me_returns_the_account() {
    let app = TestApp::new();
    let alice = app.register("Alice", "Alice@Example.com").await;
    assert_eq!(alice.email, "alice@example.com");

    let (status, body) = app.get("/api/me", Some(&alice.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], alice.id.as_str());
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_defaults_name_to_email_local_part() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/register",
            None,
            json!({ "email": "nameless@example.com", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], "nameless");
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com").await;

    let (status, body) = app
        .post(
            "/api/register",
            None,
            json!({ "email": "ALICE@example.com", "password": "another1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new();
    let cases = [
        json!({ "email": "alice@example.com" }),
        json!({ "email": "not-an-email", "password": "secret1" }),
        json!({ "email": "alice@example.com", "password": "123" }),
    ];
    for body in cases {
        let (status, res) = app.post("/api/register", None, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {res}");
        assert!(res["error"].is_string());
    }
}

#[tokio::test]
async fn admin_signup_is_ignored_unless_enabled() {
    let app = TestApp::new();
    let (_, body) = app
        .post(
            "/api/register",
            None,
            json!({ "email": "eve@example.com", "password": "secret1", "isAdmin": true }),
        )
        .await;
    assert_eq!(body["user"]["role"], "user");

    let mut config = crate::state::AppState::test_config();
    config.allow_admin_signup = true;
    let open = TestApp::with_config(config);
    let (_, body) = open
        .post(
            "/api/register",
            None,
            json!({ "email": "boss@example.com", "password": "secret1", "isAdmin": "1" }),
        )
        .await;
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com").await;

    let (wrong_pw, wrong_pw_body) = app.login("alice@example.com", "nope-nope").await;
    let (unknown, unknown_body) = app.login("ghost@example.com", "secret1").await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);

    let (ok, body) = app.login(" ALICE@example.com ", "secret1").await;
    assert_eq!(ok, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing token");

    let (status, body) = app.get("/api/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn forgot_password_replies_identically_for_unknown_emails() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com").await;

    let (s1, known) = app
        .post("/api/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await;
    let (s2, unknown) = app
        .post("/api/forgot-password", None, json!({ "email": "ghost@example.com" }))
        .await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(known, unknown);
    assert_eq!(app.fakes.mailer.sent().len(), 1);
}

#[tokio::test]
async fn forgot_password_hides_mail_failures() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com").await;
    app.fakes.mailer.fail_deliveries();

    let (s1, known) = app
        .post("/api/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await;
    let (s2, unknown) = app
        .post("/api/forgot-password", None, json!({ "email": "ghost@example.com" }))
        .await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(known, unknown);
    assert!(app.fakes.mailer.sent().is_empty());
}

#[tokio::test]
async fn reset_token_works_exactly_once() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com").await;
    app.post("/api/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await;

    let mail = app.fakes.mailer.sent().pop().unwrap();
    assert_eq!(mail.to, "alice@example.com");
    let token = mail
        .body
        .split("token=")
        .nth(1)
        .unwrap()
        .split_whitespace()
        .next()
        .unwrap()
        .to_string();

    let reset = json!({ "token": token, "newPassword": "brandnew1" });
    let (status, _) = app.post("/api/reset-password", None, reset.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/reset-password", None, reset).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");

    assert_eq!(app.login("alice@example.com", "secret1").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("alice@example.com", "brandnew1").await.0, StatusCode::OK);
}

#[tokio::test]
async fn health_is_open() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}
