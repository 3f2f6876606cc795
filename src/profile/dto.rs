use serde::{Deserialize, Serialize};

use crate::auth::dto::PublicUser;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Avatar URL, typically one returned by the upload endpoint.
    pub avatar: Option<String>,
}

/// A fresh token is returned because the claims embed name and email.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResponse {
    pub avatar_url: String,
}
