use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical book held by one user. The owner is the owner-map key it is
/// stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    pub author: String,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

impl Book {
    /// Same book under a fresh id, as handed over during an exchange.
    pub fn reissued(&self) -> Book {
        Book {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

/// Fields accepted when adding a book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

/// Owner summary attached to book details.
#[derive(Debug, Clone, Serialize)]
pub struct BookOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
