use serde::{Deserialize, Serialize};

use crate::exchange::repo_types::ExchangeRequest;

/// Offered book as the client sends it. Only the id is trusted; the rest of
/// the snapshot is taken from the requester's collection.
#[derive(Debug, Deserialize)]
pub struct OfferedBook {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExchangeRequest {
    pub book_id: Option<String>,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    #[serde(default)]
    pub requester_books: Vec<OfferedBook>,
}

#[derive(Debug, Serialize)]
pub struct ExchangeRequestsResponse {
    pub requests: Vec<ExchangeRequest>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
