use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_password: String,
    pub demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cors_origin: String,
    /// Base URL of the web client, used to build links in outgoing mail.
    pub public_url: String,
    pub avatars_dir: PathBuf,
    pub reset_token_ttl_minutes: i64,
    /// Honour `isAdmin` on registration. Off unless explicitly enabled.
    pub allow_admin_signup: bool,
    pub seed: SeedConfig,
}

pub const DEV_JWT_SECRET: &str = "dev_secret_change_me";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.into()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bookswap".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bookswap-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 7),
        };
        let seed = SeedConfig {
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            demo_data: env_flag("SEED_DEMO_DATA").unwrap_or(true),
        };
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 4000,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            jwt,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            avatars_dir: std::env::var("AVATARS_DIR")
                .unwrap_or_else(|_| "./uploads/avatars".into())
                .into(),
            reset_token_ttl_minutes: env_parse("RESET_TOKEN_TTL_MINUTES").unwrap_or(60),
            allow_admin_signup: env_flag("ALLOW_ADMIN_SIGNUP").unwrap_or(false),
            seed,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| parse_flag(&v))
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_truthy_flags() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v} should be truthy");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v} should be falsy");
        }
    }
}
