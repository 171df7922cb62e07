//! Internal endpoints for trusted callers.

use axum::{extract::State, http::StatusCode, Json};
use boardstack_core::events::{ChannelId, PublishRequest, RegistryStats};
use tracing::{debug, info};

use crate::auth::InternalAuth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fan out a payload published by another process.
pub async fn publish(
    State(state): State<AppState>,
    _auth: InternalAuth,
    Json(req): Json<PublishRequest>,
) -> ApiResult<StatusCode> {
    if req.channel.trim().is_empty() {
        return Err(ApiError::bad_request("channel is required"));
    }
    let channel = ChannelId::from(req.channel);
    info!(channel = %channel, "Received internal publish");
    debug!(
        subscribers = state.registry().subscriber_count(&channel),
        "Active subscribers"
    );
    state.events.publish_raw(&channel, req.payload.to_string());
    Ok(StatusCode::OK)
}

/// Current channel and subscriber counts.
pub async fn stats(State(state): State<AppState>, _auth: InternalAuth) -> Json<RegistryStats> {
    Json(state.registry().stats())
}
