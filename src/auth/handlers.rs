use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Duration;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MeResponse, MessageResponse,
            PublicUser, RegisterRequest, ResetPasswordRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::NewUser,
        repo_types::{PasswordResetToken, Role, User},
        services::{
            check_password_strength, display_name, is_valid_email, normalize_email,
            requests_admin,
        },
    },
    error::{AppError, AppResult},
    mailer::Email,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Treats missing and blank strings alike.
pub(crate) fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(email), Some(password)) = (non_blank(payload.email), non_blank(payload.password))
    else {
        return Err(AppError::bad_request("Email and password are required"));
    };
    let email = normalize_email(&email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    check_password_strength(&password)?;

    let wants_admin = requests_admin(payload.is_admin.as_ref());
    let role = if wants_admin && state.config.allow_admin_signup {
        Role::Admin
    } else {
        if wants_admin {
            warn!(email = %email, "admin signup requested but disabled");
        }
        Role::User
    };

    // Ensure email is not taken before paying for the hash
    if User::find_by_email(&state.db, &email).await.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::conflict("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let user = User::create(
        &state.db,
        NewUser {
            name: display_name(payload.name.as_deref(), &email),
            email,
            password_hash,
            role,
            is_email_verified: false,
        },
    )
    .await?;

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (non_blank(payload.email), non_blank(payload.password))
    else {
        return Err(AppError::bad_request("Email and password are required"));
    };
    let email = normalize_email(&email);

    let Some(user) = User::find_by_email(&state.db, &email).await else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: PublicUser::from(&user),
    })
}

const FORGOT_PASSWORD_REPLY: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Always answers the same way so the endpoint cannot be used to probe for
/// registered emails.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let Some(email) = non_blank(payload.email) else {
        return Err(AppError::bad_request("Email is required"));
    };
    let email = normalize_email(&email);

    if let Some(user) = User::find_by_email(&state.db, &email).await {
        let ttl = Duration::minutes(state.config.reset_token_ttl_minutes);
        let token = PasswordResetToken::issue(&state.db, &user, ttl).await;
        let link = format!(
            "{}/reset-password?token={}",
            state.config.public_url.trim_end_matches('/'),
            token
        );
        let sent = state
            .mailer
            .send(Email {
                to: user.email.clone(),
                reply_to: None,
                subject: "Password reset".into(),
                body: format!(
                    "Hello {},\n\nUse the link below to choose a new password. It expires in {} minutes.\n\n{}\n",
                    user.name, state.config.reset_token_ttl_minutes, link
                ),
            })
            .await;
        // a delivery failure must not change the reply
        if let Err(e) = sent {
            error!(error = %e, user_id = %user.id, "password reset mail failed");
        }
        info!(user_id = %user.id, "password reset issued");
    } else {
        warn!(email = %email, "password reset for unknown email");
    }

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_REPLY.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (Some(token), Some(new_password)) =
        (non_blank(payload.token), non_blank(payload.new_password))
    else {
        return Err(AppError::bad_request("Token and new password are required"));
    };
    check_password_strength(&new_password)?;

    let hash = hash_password(&new_password)?;
    let user = PasswordResetToken::redeem(&state.db, token.trim(), hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".into(),
    }))
}
