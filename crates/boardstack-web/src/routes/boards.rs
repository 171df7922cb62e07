//! Board route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::{self, BoardSummary, BoardUpdate, DetailedBoard, NewBoard};
use boardstack_core::events::BoardEvent;
use boardstack_db::BoardRow;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_boards(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(board::list(&state.db, &current.user.id).await?))
}

pub async fn create_board(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<NewBoard>,
) -> ApiResult<(StatusCode, Json<BoardRow>)> {
    let board = board::create(&state.db, &current.user.id, &req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<Json<DetailedBoard>> {
    Ok(Json(board::get_detailed(&state.db, &board_id, &current.user.id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<BoardUpdate>,
) -> ApiResult<Json<BoardRow>> {
    let board = board::update(&state.db, &board_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::BoardUpdated(board.clone()));
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
) -> ApiResult<StatusCode> {
    board::delete(&state.db, &board_id, &current.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
