//! Invitation route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::{AcceptedInvitation, InvitationPreview, InvitationView, NewInvitation};
use boardstack_core::events::BoardEvent;
use boardstack_core::invitation;
use boardstack_db::MemberRole;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateInvitationRequest {
    pub role: MemberRole,
}

pub async fn create_invitation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<NewInvitation>,
) -> ApiResult<(StatusCode, Json<InvitationView>)> {
    let created = invitation::create(
        &state.db,
        state.mailer.as_deref(),
        &board_id,
        &current.user.id,
        &req,
    )
    .await?;
    state.broadcast(&board_id, BoardEvent::InvitationCreated(created.clone()));
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_invitation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, invitation_id)): Path<(String, String)>,
    Json(req): Json<UpdateInvitationRequest>,
) -> ApiResult<Json<InvitationView>> {
    let updated =
        invitation::update(&state.db, &board_id, &invitation_id, &current.user.id, req.role).await?;
    state.broadcast(&board_id, BoardEvent::InvitationUpdated(updated.clone()));
    Ok(Json(updated))
}

pub async fn get_invitation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(invitation_id): Path<String>,
) -> ApiResult<Json<InvitationPreview>> {
    Ok(Json(
        invitation::get_for_invitee(&state.db, &invitation_id, &current.user).await?,
    ))
}

pub async fn delete_invitation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(invitation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = invitation::delete(&state.db, &invitation_id, &current.user).await?;
    state.broadcast(&removed.parent_board, BoardEvent::InvitationDeleted(removed.id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(invitation_id): Path<String>,
) -> ApiResult<Json<AcceptedInvitation>> {
    let accepted = invitation::accept(&state.db, &invitation_id, &current.user).await?;
    let board_id = accepted.member.parent_board.clone();
    state.broadcast(&board_id, BoardEvent::MemberCreated(accepted.member.clone()));
    state.broadcast(
        &board_id,
        BoardEvent::InvitationDeleted(accepted.invitation_id.clone()),
    );
    Ok(Json(accepted))
}
