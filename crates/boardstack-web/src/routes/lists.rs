//! List route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::NewList;
use boardstack_core::events::BoardEvent;
use boardstack_core::list;
use boardstack_db::ListRow;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_list(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<NewList>,
) -> ApiResult<(StatusCode, Json<ListRow>)> {
    let list = list::create(&state.db, &board_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::ListCreated(list.clone()));
    Ok((StatusCode::CREATED, Json(list)))
}
