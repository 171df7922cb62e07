//! Member route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::MemberView;
use boardstack_core::events::BoardEvent;
use boardstack_core::member;
use boardstack_db::MemberRole;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

pub async fn list_members(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<MemberView>>> {
    Ok(Json(member::list(&state.db, &board_id, &current.user.id).await?))
}

pub async fn update_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, member_id)): Path<(String, String)>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<MemberView>> {
    let member =
        member::update_role(&state.db, &board_id, &member_id, &current.user.id, req.role).await?;
    state.broadcast(&board_id, BoardEvent::MemberUpdated(member.clone()));
    Ok(Json(member))
}

pub async fn delete_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, member_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let member = member::delete(&state.db, &board_id, &member_id, &current.user.id).await?;
    state.broadcast(&board_id, BoardEvent::MemberDeleted(member.id));
    Ok(StatusCode::NO_CONTENT)
}
