use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binds an opaque session id to the user it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: Uuid,
}
