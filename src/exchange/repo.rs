use std::collections::HashSet;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::books::repo_types::Book;
use crate::db::{Db, Tables};
use crate::error::{AppError, AppResult};
use crate::exchange::repo_types::{ExchangeRequest, ExchangeStatus};

/// What the requester asks for and offers.
#[derive(Debug, Clone)]
pub struct NewExchange {
    pub book_id: Uuid,
    pub offered_book_ids: Vec<Uuid>,
    pub requester_name: String,
    pub requester_email: String,
}

impl ExchangeRequest {
    /// Validates the proposal against the current owner map and files it in
    /// the owner's inbox. Returns the stored request and the owner.
    pub async fn create(
        db: &Db,
        requester: &User,
        new: NewExchange,
    ) -> AppResult<(ExchangeRequest, User)> {
        let mut t = db.write().await;

        let (owner_id, book) = t
            .find_book(new.book_id)
            .map(|(owner, b)| (owner, b.clone()))
            .ok_or_else(|| AppError::not_found("Book not found"))?;
        if owner_id == requester.id {
            return Err(AppError::bad_request(
                "Cannot request exchange for your own book",
            ));
        }
        let owner = t
            .user_by_id(owner_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Book owner not found"))?;

        let held = t.books_of(requester.id);
        let mut seen = HashSet::new();
        let mut offered = Vec::with_capacity(new.offered_book_ids.len());
        for id in &new.offered_book_ids {
            if !seen.insert(*id) {
                continue;
            }
            let book = held
                .iter()
                .find(|b| b.id == *id)
                .ok_or_else(|| AppError::bad_request("Offered books must be in your collection"))?;
            offered.push(book.clone());
        }
        if offered.is_empty() {
            return Err(AppError::bad_request("Offer at least one of your books"));
        }

        let inbox = t.exchange_requests.entry(owner_id).or_default();
        if inbox
            .iter()
            .any(|r| r.is_pending() && r.book_id == book.id && r.requester_id == requester.id)
        {
            return Err(AppError::conflict(
                "You already have a pending request for this book",
            ));
        }

        let request = ExchangeRequest {
            id: Uuid::new_v4(),
            book_id: book.id,
            book_name: book.name,
            book_author: book.author,
            requester_id: requester.id,
            requester_name: new.requester_name,
            requester_email: new.requester_email,
            requester_books: offered,
            status: ExchangeStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        inbox.push(request.clone());
        Ok((request, owner))
    }

    /// Requests addressed to `recipient`, newest first.
    pub async fn list_received(db: &Db, recipient: Uuid) -> Vec<ExchangeRequest> {
        let t = db.read().await;
        let mut out = t
            .exchange_requests
            .get(&recipient)
            .cloned()
            .unwrap_or_default();
        newest_first(&mut out);
        out
    }

    /// Requests made by `requester` across every inbox, newest first.
    pub async fn list_sent(db: &Db, requester: Uuid) -> Vec<ExchangeRequest> {
        let t = db.read().await;
        let mut out: Vec<ExchangeRequest> = t
            .exchange_requests
            .values()
            .flatten()
            .filter(|r| r.requester_id == requester)
            .cloned()
            .collect();
        newest_first(&mut out);
        out
    }

    /// Accepts a pending request and swaps the books in one critical
    /// section: the requested book moves to the requester, every offered
    /// book moves to the recipient, each under a fresh id. Nothing changes
    /// unless all books are still held by their owners.
    pub async fn accept(db: &Db, recipient: Uuid, request_id: Uuid) -> AppResult<ExchangeRequest> {
        let mut t = db.write().await;
        let request = pending_in_inbox(&t, recipient, request_id)?;

        let gone = || AppError::conflict("Books in this exchange are no longer available");
        let target = t
            .books_of(recipient)
            .iter()
            .find(|b| b.id == request.book_id)
            .cloned()
            .ok_or_else(gone)?;
        let requester_books = t.books_of(request.requester_id);
        let offered = request
            .requester_books
            .iter()
            .map(|o| {
                requester_books
                    .iter()
                    .find(|b| b.id == o.id)
                    .cloned()
                    .ok_or_else(gone)
            })
            .collect::<AppResult<Vec<Book>>>()?;
        let offered_ids: HashSet<Uuid> = offered.iter().map(|b| b.id).collect();

        let owner_books = t.books.entry(recipient).or_default();
        owner_books.retain(|b| b.id != target.id);
        owner_books.extend(offered.iter().map(Book::reissued));

        let requester_books = t.books.entry(request.requester_id).or_default();
        requester_books.retain(|b| !offered_ids.contains(&b.id));
        requester_books.push(target.reissued());

        set_status(&mut t, recipient, request_id, ExchangeStatus::Completed)
    }

    pub async fn reject(db: &Db, recipient: Uuid, request_id: Uuid) -> AppResult<ExchangeRequest> {
        let mut t = db.write().await;
        pending_in_inbox(&t, recipient, request_id)?;
        set_status(&mut t, recipient, request_id, ExchangeStatus::Rejected)
    }
}

fn newest_first(requests: &mut [ExchangeRequest]) {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn pending_in_inbox(t: &Tables, recipient: Uuid, request_id: Uuid) -> AppResult<ExchangeRequest> {
    let request = t
        .exchange_requests
        .get(&recipient)
        .and_then(|inbox| inbox.iter().find(|r| r.id == request_id))
        .ok_or_else(|| AppError::not_found("Exchange request not found"))?;
    if !request.is_pending() {
        return Err(AppError::bad_request("Request is not pending"));
    }
    Ok(request.clone())
}

fn set_status(
    t: &mut Tables,
    recipient: Uuid,
    request_id: Uuid,
    status: ExchangeStatus,
) -> AppResult<ExchangeRequest> {
    let request = t
        .exchange_requests
        .get_mut(&recipient)
        .and_then(|inbox| inbox.iter_mut().find(|r| r.id == request_id))
        .ok_or_else(|| AppError::not_found("Exchange request not found"))?;
    request.status = status;
    Ok(request.clone())
}
