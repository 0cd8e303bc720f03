use std::sync::Arc;

use uuid::Uuid;

use crate::error::StoreError;
use crate::sessions::repo::SessionRepository;
use crate::sessions::repo_types::Session;

/// Thin delegation over the session store; errors pass through unchanged.
#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_session(&self, user_id: Uuid) -> Result<String, StoreError> {
        self.repo.create(user_id).await
    }

    pub async fn get_session_by_id(&self, session_id: &str) -> Result<Session, StoreError> {
        self.repo.get(session_id).await
    }

    pub async fn delete_by_id(&self, session_id: &str) -> Result<(), StoreError> {
        self.repo.delete(session_id).await
    }

    pub async fn delete_for_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.repo.delete_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::memory::InMemorySessionRepository;
    use std::time::Duration;

    fn service(ttl: Duration) -> (SessionService, InMemorySessionRepository) {
        let repo = InMemorySessionRepository::new(ttl);
        (SessionService::new(Arc::new(repo.clone())), repo)
    }

    #[tokio::test]
    async fn created_session_resolves_to_its_user() {
        let (svc, _) = service(Duration::from_secs(60));
        let user_id = Uuid::new_v4();
        let id = svc.create_session(user_id).await.unwrap();

        let session = svc.get_session_by_id(&id).await.unwrap();
        assert_eq!(session.session_id, id);
        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let (svc, _) = service(Duration::from_secs(60));
        let user_id = Uuid::new_v4();
        let a = svc.create_session(user_id).await.unwrap();
        let b = svc.create_session(user_id).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unknown_or_expired_session_is_not_found() {
        let (svc, _) = service(Duration::from_secs(60));
        assert!(matches!(
            svc.get_session_by_id("missing").await,
            Err(StoreError::NotFound)
        ));

        let (expired, _) = service(Duration::ZERO);
        let id = expired.create_session(Uuid::new_v4()).await.unwrap();
        assert!(matches!(
            expired.get_session_by_id(&id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (svc, _) = service(Duration::from_secs(60));
        let id = svc.create_session(Uuid::new_v4()).await.unwrap();
        svc.delete_by_id(&id).await.unwrap();
        svc.delete_by_id(&id).await.unwrap();
        assert!(svc.get_session_by_id(&id).await.is_err());
    }

    #[tokio::test]
    async fn delete_for_user_drops_only_that_users_sessions() {
        let (svc, repo) = service(Duration::from_secs(60));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        svc.create_session(alice).await.unwrap();
        svc.create_session(alice).await.unwrap();
        let bobs = svc.create_session(bob).await.unwrap();

        svc.delete_for_user(alice).await.unwrap();
        assert_eq!(repo.len().await, 1);
        assert_eq!(svc.get_session_by_id(&bobs).await.unwrap().user_id, bob);
    }
}
