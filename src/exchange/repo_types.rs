use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::books::repo_types::Book;

/// Lifecycle of an exchange request. `Accepted` is kept for wire
/// compatibility; acceptance moves straight to `Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

/// Proposal to trade the requester's offered books for one book of the
/// recipient. Stored in the recipient's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_name: String,
    pub book_author: String,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_email: String,
    /// Snapshots taken when the request was made.
    pub requester_books: Vec<Book>,
    pub status: ExchangeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ExchangeRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ExchangeStatus::Pending
    }
}
