use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::catalog::{self, CatalogPage, CatalogParams, CatalogQuery};
use super::dto::{
    AddBookRequest, BookDetails, BookDetailsResponse, BookResponse, BooksResponse,
    UserBooksResponse,
};
use super::repo_types::{Book, NewBook};
use crate::{
    auth::{extractors::AuthUser, handlers::non_blank},
    db::parse_id,
    error::{AppError, AppResult},
    state::AppState,
};

// --- public routers ---

pub fn my_routes() -> Router<AppState> {
    Router::new()
        .route("/me/books", get(list_my_books).post(add_book))
        .route("/me/books/:book_id", delete(delete_my_book))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_catalog))
        .route("/books/:book_id", get(get_book))
        .route("/users/:user_id/books", get(list_user_books))
}

// --- handlers ---

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_my_books(State(state): State<AppState>, AuthUser(user): AuthUser) -> Json<BooksResponse> {
    Json(BooksResponse {
        books: Book::list_for_owner(&state.db, user.id).await,
    })
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<AddBookRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let (Some(name), Some(author)) = (non_blank(payload.name), non_blank(payload.author)) else {
        return Err(AppError::bad_request("Book name and author are required"));
    };

    let book = Book::add(
        &state.db,
        user.id,
        NewBook {
            name: name.trim().to_string(),
            author: author.trim().to_string(),
            photo_url: non_blank(payload.photo_url),
            description: non_blank(payload.description),
        },
    )
    .await;

    info!(book_id = %book.id, name = %book.name, "book added");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_my_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> AppResult<StatusCode> {
    let book_id = parse_id(&book_id, "Book not found")?;
    match Book::delete_owned(&state.db, user.id, book_id).await {
        Some(book) => {
            info!(book_id = %book.id, "book deleted by owner");
            Ok(StatusCode::NO_CONTENT)
        }
        None => {
            warn!(%book_id, "delete of book not held by caller");
            Err(AppError::not_found("Book not found"))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<CatalogPage> {
    let query = CatalogQuery::from(params);
    let books = Book::list_all(&state.db).await;
    Json(catalog::run(books, &query))
}

#[instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<BookDetailsResponse>> {
    let book_id = parse_id(&book_id, "Book not found")?;
    let (book, owner) = Book::find_with_owner(&state.db, book_id)
        .await
        .ok_or_else(|| AppError::not_found("Book not found"))?;
    Ok(Json(BookDetailsResponse {
        book: BookDetails { book, owner },
    }))
}

#[instrument(skip(state))]
pub async fn list_user_books(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<UserBooksResponse> {
    let books = match Uuid::parse_str(user_id.trim()) {
        Ok(id) => Book::list_for_owner(&state.db, id).await,
        Err(_) => Vec::new(),
    };
    Json(UserBooksResponse {
        count: books.len(),
        user_id,
        books,
    })
}
