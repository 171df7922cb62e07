//! Account routes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use boardstack_core::user::{self, UserProfile};
use boardstack_core::BoardError;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::routes::auth::start_session;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Register and sign in. Answers 503 when registration is disabled.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.config.enable_registration {
        return Err(BoardError::ServiceUnavailable("registration is disabled".to_string()).into());
    }
    let user = user::signup(&state.db, &req.email, &req.full_name, &req.password).await?;
    Ok(start_session(&state, StatusCode::CREATED, user).await)
}

pub async fn me(current: CurrentUser) -> Json<UserProfile> {
    Json(current.user)
}
