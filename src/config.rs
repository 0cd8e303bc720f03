use std::{str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

/// Postgres connection string plus the bounds of the shared pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub prefix: String,
    pub ttl_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub cookie: CookieConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));

        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)?,
            shutdown_grace_secs: parse_or(&lookup, "SHUTDOWN_GRACE_SECS", 5)?,
        };

        let postgres_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                required("POSTGRES_USER")?,
                lookup("POSTGRES_PASSWORD").unwrap_or_default(),
                lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".into()),
                parse_or::<u16, _>(&lookup, "POSTGRES_PORT", 5432)?,
                required("POSTGRES_DB")?,
                lookup("POSTGRES_SSLMODE").unwrap_or_else(|| "disable".into()),
            ),
        };
        let postgres = PostgresConfig {
            url: postgres_url,
            max_connections: parse_or(&lookup, "POSTGRES_MAX_CONNECTIONS", 10)?,
            min_connections: parse_or(&lookup, "POSTGRES_MIN_CONNECTIONS", 1)?,
            acquire_timeout_secs: parse_or(&lookup, "POSTGRES_ACQUIRE_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: parse_or(&lookup, "POSTGRES_IDLE_TIMEOUT_SECS", 300)?,
            max_lifetime_secs: parse_or(&lookup, "POSTGRES_MAX_LIFETIME_SECS", 1800)?,
        };

        let redis_url = match lookup("REDIS_URL") {
            Some(url) => url,
            None => {
                let addr = lookup("REDIS_ADDR").unwrap_or_else(|| "127.0.0.1:6379".into());
                let db: u32 = parse_or(&lookup, "REDIS_DB", 0)?;
                match lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
                    Some(password) => format!("redis://:{password}@{addr}/{db}"),
                    None => format!("redis://{addr}/{db}"),
                }
            }
        };

        let session = SessionConfig {
            name: lookup("SESSION_NAME").unwrap_or_else(|| "session-id".into()),
            prefix: lookup("SESSION_PREFIX").unwrap_or_else(|| "api-session".into()),
            ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 3600)?,
        };

        let cookie = CookieConfig {
            path: lookup("COOKIE_PATH").unwrap_or_else(|| "/".into()),
            domain: lookup("COOKIE_DOMAIN").filter(|d| !d.is_empty()),
            secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
            http_only: parse_or(&lookup, "COOKIE_HTTP_ONLY", true)?,
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "accounts-api".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
        };

        let config = Self {
            server,
            postgres,
            redis: RedisConfig { url: redis_url },
            session,
            cookie,
            jwt,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_SESSION_TTL_SECS).contains(&self.session.ttl_secs),
            "SESSION_TTL_SECS must be between 1 and {MAX_SESSION_TTL_SECS}"
        );
        anyhow::ensure!(!self.session.name.is_empty(), "SESSION_NAME must not be empty");
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_MINUTES).contains(&self.jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}"
        );
        anyhow::ensure!(!self.jwt.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(
            self.postgres.max_connections >= self.postgres.min_connections,
            "POSTGRES_MAX_CONNECTIONS must be >= POSTGRES_MIN_CONNECTIONS"
        );
        Ok(())
    }
}

/// One year.
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_JWT_TTL_MINUTES: i64 = 365 * 24 * 60;

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}
