use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Coarse authorization tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record held in memory.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String, // trimmed, lower-cased
    pub password_hash: String, // argon2 PHC string
    pub name: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Pending password reset, keyed by its token string.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: OffsetDateTime,
}
