//! In-memory `UserRepository` used by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    page_fetches: Arc<AtomicUsize>,
    last_page: Arc<RwLock<Option<(&'static str, i64, i64)>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `fetch_page` ran.
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    /// Arguments of the last `fetch_page` call: (column, offset, limit).
    pub async fn last_page(&self) -> Option<(&'static str, i64, i64)> {
        *self.last_page.read().await
    }

    /// Raw stored record, hash included.
    pub async fn raw(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
            last_login: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if !changes.email.is_empty()
            && users
                .values()
                .any(|u| u.id != changes.id && u.email == changes.email)
        {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let user = users.get_mut(&changes.id).ok_or(StoreError::NotFound)?;
        if !changes.name.is_empty() {
            user.name = changes.name;
        }
        if !changes.email.is_empty() {
            user.email = changes.email;
        }
        if !changes.password_hash.is_empty() {
            user.password_hash = changes.password_hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn fetch_page(
        &self,
        order_column: &'static str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, StoreError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_page.write().await = Some((order_column, offset, limit));

        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| match order_column {
            "name" => a.name.cmp(&b.name),
            "created_at" => a.created_at.cmp(&b.created_at),
            "updated_at" => a.updated_at.cmp(&b.updated_at),
            "last_login" => a.last_login.cmp(&b.last_login),
            _ => a.email.cmp(&b.email),
        });
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
