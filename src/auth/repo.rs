use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::{PasswordResetToken, Role, User};
use crate::auth::services::{generate_reset_token, normalize_email};
use crate::db::Db;
use crate::error::{AppError, AppResult};

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_email_verified: bool,
}

/// Partial profile edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Find a user by email, case-insensitively.
    pub async fn find_by_email(db: &Db, email: &str) -> Option<User> {
        db.read().await.users.get(&normalize_email(email)).cloned()
    }

    pub async fn find_by_id(db: &Db, id: Uuid) -> Option<User> {
        db.read().await.user_by_id(id).cloned()
    }

    pub async fn list(db: &Db) -> Vec<User> {
        let mut users: Vec<User> = db.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    /// Create a new user. Fails with 409 when the email is taken.
    pub async fn create(db: &Db, new: NewUser) -> AppResult<User> {
        let email = normalize_email(&new.email);
        let mut t = db.write().await;
        if t.users.contains_key(&email) {
            return Err(AppError::conflict("User already exists"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
            is_email_verified: new.is_email_verified,
            avatar_url: None,
        };
        t.users.insert(email, user.clone());
        Ok(user)
    }

    pub async fn set_password_hash(db: &Db, id: Uuid, hash: String) -> AppResult<()> {
        let mut t = db.write().await;
        let user = t
            .user_by_id_mut(id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.password_hash = hash;
        Ok(())
    }

    /// Apply a profile edit. Changing the email re-keys the record; an email
    /// owned by someone else is a 409.
    pub async fn update_profile(db: &Db, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let mut t = db.write().await;
        let mut user = t
            .user_by_id(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(email) = changes.email.as_deref().map(normalize_email) {
            if email != user.email {
                if t.users.contains_key(&email) {
                    return Err(AppError::conflict("Email is already in use"));
                }
                t.users.remove(&user.email);
                user.email = email;
            }
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(avatar_url) = changes.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        t.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    pub async fn set_role(db: &Db, id: Uuid, role: Role) -> AppResult<User> {
        let mut t = db.write().await;
        let user = t
            .user_by_id_mut(id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.role = role;
        Ok(user.clone())
    }

    /// Remove the account together with its books, the exchange requests it
    /// received and those it sent.
    pub async fn delete_cascade(db: &Db, id: Uuid) -> AppResult<User> {
        let mut t = db.write().await;
        let email = t
            .user_by_id(id)
            .map(|u| u.email.clone())
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let user = t
            .users
            .remove(&email)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        t.books.remove(&id);
        t.exchange_requests.remove(&id);
        for inbox in t.exchange_requests.values_mut() {
            inbox.retain(|r| r.requester_id != id);
        }
        t.reset_tokens.retain(|_, tok| tok.user_id != id);
        Ok(user)
    }
}

impl PasswordResetToken {
    /// Store a fresh single-use token for the user and return it.
    pub async fn issue(db: &Db, user: &User, ttl: Duration) -> String {
        let token = generate_reset_token();
        let entry = PasswordResetToken {
            user_id: user.id,
            email: user.email.clone(),
            expires_at: OffsetDateTime::now_utc() + ttl,
        };
        db.write().await.reset_tokens.insert(token.clone(), entry);
        token
    }

    /// Consume a token and set the new password hash. The token is removed
    /// whether it was valid or expired.
    pub async fn redeem(db: &Db, token: &str, password_hash: String) -> AppResult<User> {
        let invalid = || AppError::bad_request("Invalid or expired reset token");
        let mut t = db.write().await;
        let entry = t.reset_tokens.remove(token).ok_or_else(invalid)?;
        if entry.expires_at <= OffsetDateTime::now_utc() {
            return Err(invalid());
        }
        let user = t.user_by_id_mut(entry.user_id).ok_or_else(invalid)?;
        user.password_hash = password_hash;
        Ok(user.clone())
    }
}
