use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Durable user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Empty fields in `changes` keep the stored value.
    async fn update(&self, changes: UserChanges) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// `order_column` must already be a whitelisted column name.
    async fn fetch_page(
        &self,
        order_column: &'static str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at, last_login
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "UserRepository::create"))
    }

    async fn update(&self, changes: UserChanges) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name          = COALESCE(NULLIF($2, ''), name),
                   email         = COALESCE(NULLIF($3, ''), email),
                   password_hash = COALESCE(NULLIF($4, ''), password_hash),
                   updated_at    = now()
             WHERE id = $1
            RETURNING id, name, email, password_hash, created_at, updated_at, last_login
            "#,
        )
        .bind(changes.id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "UserRepository::update"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "UserRepository::delete"))?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "UserRepository::get_by_id"))
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "UserRepository::get_by_email"))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM users")
            .fetch_one(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "UserRepository::count"))
    }

    async fn fetch_page(
        &self,
        order_column: &'static str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, StoreError> {
        // Column names cannot be bound; `order_column` comes from a fixed whitelist.
        let sql = format!(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at, last_login
            FROM users
            ORDER BY {order_column}, id
            OFFSET $1
            LIMIT $2
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "UserRepository::fetch_page"))
    }
}
