use std::env;

/// Fallback signing secret for local runs. Never accepted in production.
const LOCAL_JWT_SECRET: &str = "second-brain-local-development-secret";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and immutable
/// afterwards; handlers and the auth gate pull it out of `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` is only allowed locally and selects the in-memory store.
    pub db_url: Option<String>,
    // Runtime environment marker.
    pub env: Env,
    // HMAC secret used to sign and verify identity tokens.
    pub jwt_secret: String,
    // Lifetime of an issued token, in hours.
    pub token_ttl_hours: i64,
    // bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Answer unknown share hashes with 411 instead of 404.
    pub legacy_status_codes: bool,
}

/// Env
///
/// Runtime context. Production requires every secret to be set explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bind_addr: "0.0.0.0:3000".to_string(),
            legacy_status_codes: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics when `JWT_SECRET` or `DATABASE_URL` is missing in production, so the
    /// server never starts with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (jwt_secret, db_url) = match env {
            Env::Production => (
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
                Some(
                    env::var("DATABASE_URL")
                        .expect("FATAL: DATABASE_URL must be set in production."),
                ),
            ),
            Env::Local => (
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                env::var("DATABASE_URL").ok(),
            ),
        };

        let defaults = Self::default();

        Self {
            db_url,
            env,
            jwt_secret,
            token_ttl_hours: parse_var("JWT_TTL_HOURS").unwrap_or(defaults.token_ttl_hours),
            bcrypt_cost: parse_var("BCRYPT_COST").unwrap_or(defaults.bcrypt_cost),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            legacy_status_codes: parse_var("LEGACY_STATUS_CODES")
                .unwrap_or(defaults.legacy_status_codes),
        }
    }
}

/// Reads and parses an optional variable; unset or unparsable values yield `None`.
fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
