use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::sessions::repo_types::Session;

/// Ephemeral session records with a store-enforced TTL.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Returns the new, randomly generated session id.
    async fn create(&self, user_id: Uuid) -> Result<String, StoreError>;

    /// `NotFound` when the id is unknown or expired.
    async fn get(&self, session_id: &str) -> Result<Session, StoreError>;

    /// Deleting a missing session is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;

    /// Drops every session issued to `user_id`.
    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError>;
}

pub fn session_key(prefix: &str, session_id: &str) -> String {
    format!("{prefix}:{session_id}")
}

pub fn user_index_key(prefix: &str, user_id: Uuid) -> String {
    format!("{prefix}:user:{user_id}")
}

#[derive(Clone)]
pub struct RedisSessionRepository {
    conn: ConnectionManager,
    prefix: String,
    ttl: Duration,
}

impl RedisSessionRepository {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            ttl,
        }
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn create(&self, user_id: Uuid) -> Result<String, StoreError> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id,
        };
        let payload = serde_json::to_string(&session).context("encode session")?;
        let key = session_key(&self.prefix, &session.session_id);
        let index = user_index_key(&self.prefix, user_id);
        let ttl_secs = self.ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(&payload)
            .arg("EX")
            .arg(ttl_secs)
            .ignore()
            .cmd("SADD")
            .arg(&index)
            .arg(&session.session_id)
            .ignore()
            .cmd("EXPIRE")
            .arg(&index)
            .arg(ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .context("SessionRepository::create")?;

        debug!(%user_id, session_id = %session.session_id, "session stored");
        Ok(session.session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(session_key(&self.prefix, session_id))
            .await
            .context("SessionRepository::get")?;
        let raw = raw.ok_or(StoreError::NotFound)?;
        let session = serde_json::from_str(&raw).context("decode session")?;
        Ok(session)
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let key = session_key(&self.prefix, session_id);
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn
            .get(&key)
            .await
            .context("SessionRepository::delete")?;
        conn.del::<_, ()>(&key)
            .await
            .context("SessionRepository::delete")?;

        if let Some(session) = raw.and_then(|r| serde_json::from_str::<Session>(&r).ok()) {
            conn.srem::<_, _, ()>(user_index_key(&self.prefix, session.user_id), session_id)
                .await
                .context("SessionRepository::delete")?;
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        let index = user_index_key(&self.prefix, user_id);
        let mut conn = self.conn.clone();

        let ids: Vec<String> = conn
            .smembers(&index)
            .await
            .context("SessionRepository::delete_by_user")?;

        let mut keys: Vec<String> = ids
            .iter()
            .map(|id| session_key(&self.prefix, id))
            .collect();
        keys.push(index);
        conn.del::<_, ()>(keys)
            .await
            .context("SessionRepository::delete_by_user")?;

        debug!(%user_id, count = ids.len(), "user sessions dropped");
        Ok(())
    }
}
