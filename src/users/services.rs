use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password, HashError};
use crate::error::{ApiError, ApiResult, StoreError};
use crate::users::pagination::PaginationQuery;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, PublicUser, UserChanges, UserPage};

/// Sanitized user plus the bearer token issued for it.
#[derive(Debug, Serialize)]
pub struct AuthToken {
    pub user: PublicUser,
    pub token: String,
}

/// Registration input with the plaintext password.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Update input; empty strings leave the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

fn user_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::NotFound("user not found".into()),
        other => other.into(),
    }
}

fn hash_or_reject(plain: &str) -> ApiResult<String> {
    hash_password(plain).map_err(|e| match e {
        HashError::TooLong => ApiError::Validation(e.to_string()),
        HashError::Argon2(_) => ApiError::Internal(anyhow::Error::new(e)),
    })
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> ApiResult<AuthToken> {
        let password_hash = hash_or_reject(&input.password)?;

        let created = self
            .repo
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::Conflict("email already registered".into()),
                other => other.into(),
            })?;
        let user = created.sanitize();

        let token = self
            .keys
            .sign(user.id, &user.email)
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, "user registered");
        Ok(AuthToken { user, token })
    }

    /// Unknown email is `NotFound`, a wrong password is `Unauthorized`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthToken> {
        let found = self.repo.get_by_email(email).await.map_err(user_not_found)?;

        if !verify_password(password, &found.password_hash) {
            warn!(user_id = %found.id, "login invalid password");
            return Err(ApiError::Unauthorized("invalid credentials".into()));
        }

        let user = found.sanitize();
        let token = self
            .keys
            .sign(user.id, &user.email)
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, "user logged in");
        Ok(AuthToken { user, token })
    }

    #[instrument(skip(self, update), fields(user_id = %update.id))]
    pub async fn update(&self, update: UserUpdate) -> ApiResult<PublicUser> {
        let password_hash = if update.password.is_empty() {
            String::new()
        } else {
            hash_or_reject(&update.password)?
        };

        let updated = self
            .repo
            .update(UserChanges {
                id: update.id,
                name: update.name,
                email: update.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::Conflict("email already registered".into()),
                other => user_not_found(other),
            })?;

        Ok(updated.sanitize())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid) -> ApiResult<()> {
        self.repo.delete(user_id).await.map_err(user_not_found)?;
        info!(%user_id, "user deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, user_id: Uuid) -> ApiResult<PublicUser> {
        let user = self.repo.get_by_id(user_id).await.map_err(user_not_found)?;
        Ok(user.sanitize())
    }

    #[instrument(skip(self))]
    pub async fn get_users(&self, query: &PaginationQuery) -> ApiResult<UserPage> {
        let order_column = query.order_column()?;
        let total_count = self.repo.count().await?;

        let mut page = UserPage {
            total_count,
            total_pages: query.total_pages(total_count),
            page: query.page,
            size: query.size,
            order_by: order_column.to_string(),
            has_more: query.has_more(total_count),
            users: Vec::new(),
        };
        if total_count == 0 {
            return Ok(page);
        }

        let rows = self
            .repo
            .fetch_page(order_column, query.offset(), query.limit())
            .await?;
        page.users = rows.into_iter().map(|u| u.sanitize()).collect();
        Ok(page)
    }
}
