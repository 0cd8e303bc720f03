use std::time::Duration;

use anyhow::Context;
use redis::aio::ConnectionManager;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::{PostgresConfig, RedisConfig};

/// Bounded pool shared by every request.
pub async fn connect_postgres(cfg: &PostgresConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .connect(&cfg.url)
        .await
        .context("connect to database")?;
    info!(max_connections = cfg.max_connections, "postgres pool ready");
    Ok(db)
}

/// Multiplexed Redis connection; clones share one socket and reconnect on failure.
pub async fn connect_redis(cfg: &RedisConfig) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(cfg.url.as_str()).context("parse redis url")?;
    let manager = ConnectionManager::new(client)
        .await
        .context("connect to redis")?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .context("redis ping")?;

    info!("redis connection ready");
    Ok(manager)
}
