//! In-memory `SessionRepository` with TTL, for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::sessions::repo::SessionRepository;
use crate::sessions::repo_types::Session;

#[derive(Debug, Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, (Session, Instant)>>>,
    ttl: Duration,
}

impl InMemorySessionRepository {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, user_id: Uuid) -> Result<String, StoreError> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id,
        };
        let id = session.session_id.clone();
        self.sessions
            .write()
            .await
            .insert(id.clone(), (session, Instant::now() + self.ttl));
        Ok(id)
    }

    async fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        match self.sessions.read().await.get(session_id) {
            Some((session, expires_at)) if *expires_at > Instant::now() => Ok(session.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .retain(|_, (session, _)| session.user_id != user_id);
        Ok(())
    }
}
