//! Sign-in and sign-out.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use boardstack_core::user::{self, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{cleared_session_cookie, session_cookie, CurrentUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Open a session for `user` and answer with its token and cookie.
pub(crate) async fn start_session(
    state: &AppState,
    status: StatusCode,
    user: UserProfile,
) -> impl IntoResponse {
    let token = state.sessions.create(&user.id).await;
    (
        status,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(SessionResponse { token, user }),
    )
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user::authenticate(&state.db, &req.email, &req.password).await?;
    info!(user = %user.id, "User signed in");
    Ok(start_session(&state, StatusCode::OK, user).await)
}

pub async fn sign_out(State(state): State<AppState>, current: CurrentUser) -> impl IntoResponse {
    state.sessions.revoke(&current.token).await;
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, cleared_session_cookie())]),
    )
}
