//! Label route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::{LabelUpdate, NewLabel};
use boardstack_core::events::BoardEvent;
use boardstack_core::label;
use boardstack_db::LabelRow;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_labels(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<LabelRow>>> {
    Ok(Json(label::list(&state.db, &board_id, &current.user.id).await?))
}

pub async fn create_label(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<NewLabel>,
) -> ApiResult<(StatusCode, Json<LabelRow>)> {
    let label = label::create(&state.db, &board_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::LabelCreated(label.clone()));
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn update_label(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, label_id)): Path<(String, String)>,
    Json(req): Json<LabelUpdate>,
) -> ApiResult<Json<LabelRow>> {
    let label = label::update(&state.db, &board_id, &label_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::LabelUpdated(label.clone()));
    Ok(Json(label))
}

pub async fn delete_label(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, label_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    label::delete(&state.db, &board_id, &label_id, &current.user.id).await?;
    state.broadcast(&board_id, BoardEvent::LabelDeleted(label_id));
    Ok(StatusCode::NO_CONTENT)
}
