use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Never leaves the service layer as-is.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub last_login: OffsetDateTime,
}

/// User as seen by callers: the password hash is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login: OffsetDateTime,
}

impl User {
    pub fn sanitize(self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login: self.last_login,
        }
    }
}

/// Insert payload; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update. An empty string keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// One page of users plus the metadata the client pages with.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub total_count: i64,
    pub total_pages: i64,
    pub page: u32,
    pub size: u32,
    pub order_by: String,
    pub has_more: bool,
    pub users: Vec<PublicUser>,
}
