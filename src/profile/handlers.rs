use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    routing::{post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{AvatarUploadResponse, ChangePasswordRequest, ProfileResponse, UpdateProfileRequest};
use crate::{
    auth::{
        dto::{MessageResponse, PublicUser},
        extractors::AuthUser,
        handlers::non_blank,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::ProfileChanges,
        repo_types::User,
        services::{check_password_strength, is_valid_email, normalize_email},
    },
    error::{AppError, AppResult},
    state::AppState,
    storage::{ext_from_mime, owned_key_from_url, AVATARS_URL_PREFIX},
};

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me/profile", put(update_profile))
        .route("/me/password", put(change_password))
        .route(
            "/me/avatar",
            // headroom for multipart framing so oversize files get a clear message
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)),
        )
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let name = match payload.name {
        Some(n) if n.trim().is_empty() => {
            return Err(AppError::bad_request("Name cannot be empty"));
        }
        Some(n) => Some(n.trim().to_string()),
        None => None,
    };
    let email = match payload.email {
        Some(e) => {
            let e = normalize_email(&e);
            if !is_valid_email(&e) {
                return Err(AppError::bad_request("Invalid email"));
            }
            Some(e)
        }
        None => None,
    };

    let avatar_url = non_blank(payload.avatar).map(|a| a.trim().to_string());
    if let Some(url) = avatar_url.as_deref() {
        if url.starts_with(AVATARS_URL_PREFIX) && owned_key_from_url(url, user.id).is_none() {
            warn!(avatar = url, "profile pointed at an upload it does not own");
            return Err(AppError::bad_request("Avatar must be one of your own uploads"));
        }
    }

    let updated = User::update_profile(
        &state.db,
        user.id,
        ProfileChanges {
            name,
            email,
            avatar_url,
        },
    )
    .await?;
    let token = JwtKeys::from_ref(&state).sign(&updated)?;

    info!(email = %updated.email, "profile updated");
    Ok(Json(ProfileResponse {
        user: PublicUser::from(&updated),
        token,
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (Some(current), Some(new_password)) = (
        non_blank(payload.current_password),
        non_blank(payload.new_password),
    ) else {
        return Err(AppError::bad_request(
            "Current and new password are required",
        ));
    };

    if !verify_password(&current, &user.password_hash)? {
        warn!("password change with wrong current password");
        return Err(AppError::bad_request("Current password is incorrect"));
    }
    check_password_strength(&new_password)?;

    let hash = hash_password(&new_password)?;
    User::set_password_hash(&state.db, user.id, hash).await?;

    info!("password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully".into(),
    }))
}

/// POST /me/avatar (multipart)
/// Field: avatar (one image file)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<AvatarUploadResponse>> {
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "bad multipart body");
        AppError::bad_request("Invalid upload")
    })? {
        if field.name() != Some("avatar") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Some(ext) = ext_from_mime(&content_type) else {
            return Err(AppError::bad_request(
                "Avatar must be a JPEG, PNG, GIF or WebP image",
            ));
        };
        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "avatar upload read failed");
            AppError::bad_request("File size exceeds 5MB limit")
        })?;
        if data.is_empty() {
            return Err(AppError::bad_request("Avatar file is empty"));
        }
        if data.len() > MAX_AVATAR_BYTES {
            return Err(AppError::bad_request("File size exceeds 5MB limit"));
        }

        let key = format!("{}-{}.{}", user.id, Uuid::new_v4(), ext);
        state.storage.put_object(&key, data, &content_type).await?;
        let avatar_url = state.storage.public_url(&key);

        User::update_profile(
            &state.db,
            user.id,
            ProfileChanges {
                avatar_url: Some(avatar_url.clone()),
                ..Default::default()
            },
        )
        .await?;

        // only files this user uploaded are ever removed
        if let Some(old_key) = user
            .avatar_url
            .as_deref()
            .and_then(|url| owned_key_from_url(url, user.id))
        {
            if let Err(e) = state.storage.delete_object(old_key).await {
                error!(error = %e, key = old_key, "failed to remove previous avatar");
            }
        }

        info!(%avatar_url, "avatar uploaded");
        return Ok(Json(AvatarUploadResponse { avatar_url }));
    }

    Err(AppError::bad_request("No avatar file found"))
}
