use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::PublicUser;

/// Identity resolved by [`require_session`] for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: PublicUser,
}

/// Auth gate for protected routes: session cookie -> session -> user.
///
/// Every failure is answered with 401, including a session whose user no
/// longer exists.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let Some(session_id) = jar
        .get(&state.config.session.name)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
    else {
        warn!(%request_id, "auth gate: missing session cookie");
        return Err(ApiError::unauthorized());
    };

    let session = match state.sessions.get_session_by_id(&session_id).await {
        Ok(s) => s,
        Err(e) => {
            warn!(%request_id, error = %e, "auth gate: session lookup failed");
            return Err(ApiError::unauthorized());
        }
    };

    let user = match state.users.get_by_id(session.user_id).await {
        Ok(u) => u,
        Err(e) => {
            warn!(%request_id, user_id = %session.user_id, error = %e, "auth gate: session user lookup failed");
            return Err(ApiError::unauthorized());
        }
    };

    let remote_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    info!(
        %request_id,
        %remote_address,
        user_id = %user.id,
        %session_id,
        "auth gate: session accepted"
    );

    request.extensions_mut().insert(AuthUser { user });
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}
