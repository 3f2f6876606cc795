use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    AdminBookView, AdminBooksResponse, AdminUserView, AdminUsersResponse, ChangeRoleRequest,
    RoleChangedResponse,
};
use crate::{
    auth::{
        extractors::AdminUser,
        repo_types::{Role, User},
    },
    books::repo_types::Book,
    db::parse_id,
    error::{AppError, AppResult},
    exchange::dto::SuccessResponse,
    state::AppState,
    storage::owned_key_from_url,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id", delete(delete_user))
        .route("/admin/users/:user_id/role", put(change_role))
        .route("/admin/books", get(list_books))
        .route("/admin/books/:book_id", delete(delete_book))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Json<AdminUsersResponse> {
    let users = User::list(&state.db).await;
    Json(AdminUsersResponse {
        users: users.iter().map(AdminUserView::from).collect(),
    })
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_books(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Json<AdminBooksResponse> {
    let books = Book::list_with_owners(&state.db)
        .await
        .into_iter()
        .map(|(owner_id, book, owner)| {
            AdminBookView::new(owner_id, book, owner.map(|o| (o.name, o.email)))
        })
        .collect();
    Json(AdminBooksResponse { books })
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(book_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let book_id = parse_id(&book_id, "Book not found")?;
    let (owner_id, book) = Book::delete_any(&state.db, book_id)
        .await
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    info!(%book_id, %owner_id, name = %book.name, "admin deleted book");
    Ok(Json(SuccessResponse::ok("Book deleted successfully")))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let user_id = parse_id(&user_id, "User not found")?;
    if user_id == admin.id {
        return Err(AppError::bad_request("Cannot delete your own account"));
    }

    let removed = User::delete_cascade(&state.db, user_id).await?;
    if let Some(key) = removed
        .avatar_url
        .as_deref()
        .and_then(|url| owned_key_from_url(url, removed.id))
    {
        if let Err(e) = state.storage.delete_object(key).await {
            tracing::warn!(error = %e, key, "failed to remove avatar of deleted user");
        }
    }

    info!(%user_id, email = %removed.email, "admin deleted user");
    Ok(Json(SuccessResponse::ok("User deleted successfully")))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn change_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<RoleChangedResponse>> {
    let role = payload
        .role
        .as_deref()
        .map(str::trim)
        .and_then(Role::parse)
        .ok_or_else(|| AppError::bad_request("Invalid role. Must be 'admin' or 'user'"))?;
    let user_id = parse_id(&user_id, "User not found")?;
    if user_id == admin.id {
        return Err(AppError::bad_request("Cannot change your own role"));
    }

    let user = User::set_role(&state.db, user_id, role).await?;

    info!(%user_id, %role, "admin changed role");
    Ok(Json(RoleChangedResponse {
        success: true,
        message: format!("User role updated to {role}"),
        user: AdminUserView::from(&user),
    }))
}
