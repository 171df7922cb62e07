//! Sessions and request authentication.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use boardstack_core::user::{self, UserProfile};
use boardstack_core::BoardError;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "boardstack_session";

/// In-memory session tokens mapped to user ids.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user_id` and return its token.
    pub async fn create(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner.write().await.insert(token.clone(), user_id.to_string());
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.inner.read().await.get(token).cloned()
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer(headers)
        .or_else(|| cookie(headers, SESSION_COOKIE))
        .map(str::to_string)
}

pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

pub fn cleared_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// The signed-in caller. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserProfile,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(BoardError::Unauthenticated)?;
        let user_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or(BoardError::Unauthenticated)?;
        match user::get_profile(&state.db, &user_id).await {
            Ok(user) => Ok(CurrentUser { user, token }),
            Err(e) if e.is_not_found() => {
                debug!(user = %user_id, "Session refers to a missing user");
                state.sessions.revoke(&token).await;
                Err(BoardError::Unauthenticated.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Caller presenting the internal bearer token.
///
/// Internal routes answer 404 when no token is configured.
pub struct InternalAuth;

impl FromRequestParts<AppState> for InternalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.internal_token.as_deref() else {
            return Err(ApiError::not_found("not found"));
        };
        match bearer(&parts.headers) {
            Some(token) if token == expected => Ok(InternalAuth),
            _ => Err(ApiError::Status(
                StatusCode::UNAUTHORIZED,
                "invalid internal token".to_string(),
            )),
        }
    }
}
