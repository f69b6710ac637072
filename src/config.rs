use anyhow::{ensure, Context};
use serde::Deserialize;

/// bcrypt rejects work factors outside this range.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;
/// Ten years.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub seed_movies: bool,
    /// Mount point for every route; empty serves them at the root.
    pub api_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "movie-collection".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "movie-collection-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60 * 24 * 7)?,
        };
        let config = Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt,
            bcrypt_cost: env_or("BCRYPT_COST", 10)?,
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
            ),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 3000)?,
            seed_movies: env_or("SEED_MOVIES", false)?,
            api_prefix: normalize_prefix(&std::env::var("API_PREFIX").unwrap_or_default()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks that parsing alone cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_TTL_MINUTES).contains(&self.jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
            self.jwt.ttl_minutes
        );
        ensure!(
            BCRYPT_COST_RANGE.contains(&self.bcrypt_cost),
            "BCRYPT_COST must be between {} and {}, got {}",
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end(),
            self.bcrypt_cost
        );
        ensure!(self.max_connections > 0, "DATABASE_MAX_CONNECTIONS must be positive");
        Ok(())
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `api/v1/` and `/api/v1` both become `/api/v1`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
