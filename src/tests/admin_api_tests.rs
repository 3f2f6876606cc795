use axum::http::StatusCode;
use serde_json::json;

use super::TestApp;

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = TestApp::new();
    let alice = app.register("Alice", "alice@example.com").await;

    for uri in ["/api/admin/users", "/api/admin/books"] {
        let (status, body) = app.get(uri, Some(&alice.token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");
    }
    let (status, _) = app.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_users_and_books_with_owners() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let alice = app.register("Alice", "alice@example.com").await;
    app.add_book(&alice.token, "Dune", "Frank Herbert").await;

    let (status, body) = app.get("/api/admin/users", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    assert!(users.iter().any(|u| u["isEmailVerified"] == true));

    let (_, body) = app.get("/api/admin/books", Some(&admin.token)).await;
    let book = &body["books"][0];
    assert_eq!(book["name"], "Dune");
    assert_eq!(book["ownerId"], alice.id.as_str());
    assert_eq!(book["ownerName"], "Alice");
    assert_eq!(book["ownerEmail"], "alice@example.com");
}

#[tokio::test]
async fn admin_deletes_any_book() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let alice = app.register("Alice", "alice@example.com").await;
    let book = app.add_book(&alice.token, "Dune", "Frank Herbert").await;

    let uri = format!("/api/admin/books/{book}");
    let (status, body) = app.delete(&uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.delete(&uri, Some(&admin.token)).await.0, StatusCode::NOT_FOUND);

    let (_, mine) = app.get("/api/me/books", Some(&alice.token)).await;
    assert!(mine["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let alice = app.register("Alice", "alice@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    let wanted = app.add_book(&bob.token, "Dune", "Frank Herbert").await;
    let offered = app.add_book(&alice.token, "Emma", "Jane Austen").await;
    app.post(
        "/api/books/exchange-request",
        Some(&alice.token),
        json!({ "bookId": wanted, "requesterBooks": [{ "id": offered }] }),
    )
    .await;

    let (status, _) = app
        .delete(&format!("/api/admin/users/{}", alice.id), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, inbox) = app.get("/api/exchange/requests", Some(&bob.token)).await;
    assert!(inbox["requests"].as_array().unwrap().is_empty());
    let (_, all) = app.get("/api/books", None).await;
    assert_eq!(all["pagination"]["totalBooks"], 1);

    // the deleted account's token stops working
    let (status, _) = app.get("/api/me", Some(&alice.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .delete(&format!("/api/admin/users/{}", alice.id), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_cannot_delete_or_demote_self() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let (status, body) = app
        .delete(&format!("/api/admin/users/{}", admin.id), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot delete your own account");

    let (status, body) = app
        .put(
            &format!("/api/admin/users/{}/role", admin.id),
            Some(&admin.token),
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot change your own role");
}

#[tokio::test]
async fn role_changes_apply_to_existing_tokens() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let alice = app.register("Alice", "alice@example.com").await;
    let uri = format!("/api/admin/users/{}/role", alice.id);

    let (status, _) = app
        .put(&uri, Some(&admin.token), json!({ "role": "superuser" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(&uri, Some(&admin.token), json!({ "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");

    let (status, _) = app.get("/api/admin/users", Some(&alice.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put(
            &format!("/api/admin/users/{}/role", uuid::Uuid::new_v4()),
            Some(&admin.token),
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
