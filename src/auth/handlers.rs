use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, ListUsersParams, LoginRequest, RegisterRequest, UpdateUserRequest},
        extractors::{require_session, AuthUser},
    },
    config::AppConfig,
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        pagination::PaginationQuery,
        repo_types::{PublicUser, UserPage},
        services::{Registration, UserUpdate},
    },
};

const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

fn session_cookie(cfg: &AppConfig, session_id: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((cfg.session.name.clone(), session_id))
        .path(cfg.cookie.path.clone())
        .http_only(cfg.cookie.http_only)
        .secure(cfg.cookie.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::try_from(cfg.session.ttl()).unwrap_or(time::Duration::MAX))
        .build();
    if let Some(domain) = &cfg.cookie.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

fn expired_session_cookie(cfg: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((cfg.session.name.clone(), ""))
        .path(cfg.cookie.path.clone())
        .build();
    if let Some(domain) = &cfg.cookie.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/all", get(get_users))
        .route("/me", get(get_me))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    let auth = state
        .users
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let session_id = state.sessions.create_session(auth.user.id).await?;
    let jar = jar.add(session_cookie(&state.config, session_id));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: auth.user,
            token: auth.token,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = payload.email.trim().to_lowercase();

    let auth = state
        .users
        .login(&email, &payload.password)
        .await
        .map_err(|e| match e {
            // Unknown email and bad password look the same to the client.
            ApiError::NotFound(_) | ApiError::Unauthorized(_) => {
                ApiError::Unauthorized("invalid credentials".into())
            }
            other => other,
        })?;

    let session_id = state.sessions.create_session(auth.user.id).await?;
    let jar = jar.add(session_cookie(&state.config, session_id));

    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse {
            user: auth.user,
            token: auth.token,
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let session_id = jar
        .get(&state.config.session.name)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    state.sessions.delete_by_id(&session_id).await?;
    info!("session closed");

    Ok((
        StatusCode::NO_CONTENT,
        jar.remove(expired_session_cookie(&state.config)),
    ))
}

#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    params: Result<Query<ListUsersParams>, QueryRejection>,
) -> ApiResult<Json<UserPage>> {
    let Query(params) = params?;
    let query = PaginationQuery::try_from(params)?;
    let page = state.users.get_users(&query).await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Path(id) = id.map_err(|_| ApiError::Validation("invalid user id".into()))?;
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user))
}

#[instrument(skip(auth))]
pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.user)
}

#[instrument(skip(state, auth, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Path(id) = id.map_err(|_| ApiError::Validation("invalid user id".into()))?;
    let Json(payload) = payload?;

    let email = payload.email.trim().to_lowercase();
    if !email.is_empty() && !is_valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if !payload.password.is_empty() && payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("password too short".into()));
    }

    let user = state
        .users
        .update(UserUpdate {
            id,
            name: payload.name.trim().to_string(),
            email,
            password: payload.password,
        })
        .await?;
    info!(user_id = %id, by = %auth.user.id, "user updated");
    Ok(Json(user))
}

/// Deletes the user and every session issued to them.
#[instrument(skip(state, auth, jar))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id.map_err(|_| ApiError::Validation("invalid user id".into()))?;

    state.users.delete(id).await?;
    state.sessions.delete_for_user(id).await?;
    info!(user_id = %id, by = %auth.user.id, "user deleted with sessions");

    let jar = if auth.user.id == id {
        jar.remove(expired_session_cookie(&state.config))
    } else {
        jar
    };
    Ok((StatusCode::NO_CONTENT, jar))
}
