use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::books::repo_types::Book;

const UNKNOWN_OWNER: &str = "Unknown";

/// Account as listed to administrators. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub avatar_url: Option<String>,
}

impl From<&User> for AdminUserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
            is_email_verified: u.is_email_verified,
            avatar_url: u.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUserView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookView {
    #[serde(flatten)]
    pub book: Book,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: String,
}

impl AdminBookView {
    pub fn new(owner_id: Uuid, book: Book, owner: Option<(String, String)>) -> Self {
        let (owner_name, owner_email) =
            owner.unwrap_or_else(|| (UNKNOWN_OWNER.into(), UNKNOWN_OWNER.into()));
        Self {
            book,
            owner_id,
            owner_name,
            owner_email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminBooksResponse {
    pub books: Vec<AdminBookView>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleChangedResponse {
    pub success: bool,
    pub message: String,
    pub user: AdminUserView,
}
