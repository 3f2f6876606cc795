mod admin;
mod app;
mod auth;
mod books;
mod config;
mod db;
mod error;
mod exchange;
mod mailer;
mod profile;
mod seed;
mod state;
mod storage;

#[cfg(test)]
mod tests;

use crate::config::{AppConfig, DEV_JWT_SECRET};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "bookswap=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.jwt.secret == DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET not set; using the development secret");
    }
    if config.allow_admin_signup {
        tracing::warn!("ALLOW_ADMIN_SIGNUP is on; anyone can register as admin");
    }

    let app_state = AppState::init(config).await?;
    seed::run(&app_state.db, &app_state.config.seed).await?;

    let config = app_state.config.clone();
    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
