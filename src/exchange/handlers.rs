use std::fmt::Write as _;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateExchangeRequest, ExchangeRequestsResponse, SuccessResponse};
use super::repo::NewExchange;
use super::repo_types::ExchangeRequest;
use crate::{
    auth::{extractors::AuthUser, handlers::non_blank, repo_types::User},
    db::parse_id,
    error::{AppError, AppResult},
    mailer::Email,
    state::AppState,
};

pub fn exchange_routes() -> Router<AppState> {
    Router::new()
        .route("/books/exchange-request", post(create_request))
        .route("/exchange/requests", get(list_received))
        .route("/exchange/requests/:request_id/accept", post(accept_request))
        .route("/exchange/requests/:request_id/reject", post(reject_request))
        .route("/me/exchange-requests", get(list_sent))
}

#[instrument(skip(state, user, payload), fields(requester_id = %user.id))]
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateExchangeRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let Some(book_id) = non_blank(payload.book_id) else {
        return Err(AppError::bad_request("bookId is required"));
    };
    if payload.requester_books.is_empty() {
        return Err(AppError::bad_request("Offer at least one of your books"));
    }
    let book_id = parse_id(&book_id, "Book not found")?;
    let offered_book_ids = payload
        .requester_books
        .iter()
        .map(|b| {
            Uuid::parse_str(b.id.trim())
                .map_err(|_| AppError::bad_request("Offered books must be in your collection"))
        })
        .collect::<AppResult<Vec<Uuid>>>()?;

    let new = NewExchange {
        book_id,
        offered_book_ids,
        requester_name: non_blank(payload.requester_name)
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| user.name.clone()),
        requester_email: non_blank(payload.requester_email)
            .map(|e| e.trim().to_string())
            .unwrap_or_else(|| user.email.clone()),
    };
    let (request, owner) = ExchangeRequest::create(&state.db, &user, new).await?;

    info!(
        request_id = %request.id,
        book_id = %request.book_id,
        owner_id = %owner.id,
        offered = request.requester_books.len(),
        "exchange requested"
    );

    // The request stands even if the notification cannot be delivered.
    if let Err(e) = state.mailer.send(request_email(&owner, &request)).await {
        warn!(error = %e, request_id = %request.id, "exchange notification failed");
    }

    Ok(Json(SuccessResponse::ok(
        "Exchange request sent successfully! The book owner has been notified.",
    )))
}

fn request_email(owner: &User, request: &ExchangeRequest) -> Email {
    let mut body = format!(
        "Hello {},\n\n{} ({}) is interested in exchanging books with you!\n\n\
         They want your book: \"{}\" by {}\n\n\
         They are offering the following books for exchange:\n",
        owner.name,
        request.requester_name,
        request.requester_email,
        request.book_name,
        request.book_author,
    );
    for (i, book) in request.requester_books.iter().enumerate() {
        let _ = writeln!(body, "{}. \"{}\" by {}", i + 1, book.name, book.author);
    }
    body.push_str("\nPlease check your Exchange tab to accept or reject this request.\n");

    Email {
        to: owner.email.clone(),
        reply_to: Some(request.requester_email.clone()),
        subject: format!("Book Exchange Request for \"{}\"", request.book_name),
        body,
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_received(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<ExchangeRequestsResponse> {
    let requests = ExchangeRequest::list_received(&state.db, user.id).await;
    tracing::debug!(count = requests.len(), "exchange inbox fetched");
    Json(ExchangeRequestsResponse { requests })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_sent(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<ExchangeRequestsResponse> {
    Json(ExchangeRequestsResponse {
        requests: ExchangeRequest::list_sent(&state.db, user.id).await,
    })
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn accept_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let request_id = parse_id(&request_id, "Exchange request not found")?;
    let request = ExchangeRequest::accept(&state.db, user.id, request_id).await?;

    info!(
        %request_id,
        book = %request.book_name,
        requester_id = %request.requester_id,
        offered = request.requester_books.len(),
        "exchange completed"
    );
    Ok(Json(SuccessResponse::ok(
        "Exchange completed successfully! Books have been exchanged between users.",
    )))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let request_id = parse_id(&request_id, "Exchange request not found")?;
    ExchangeRequest::reject(&state.db, user.id, request_id).await?;

    info!(%request_id, "exchange rejected");
    Ok(Json(SuccessResponse::ok("Exchange request rejected.")))
}
