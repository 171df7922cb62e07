//! Card route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardstack_core::board::{CardUpdate, NewCard};
use boardstack_core::card;
use boardstack_core::events::BoardEvent;
use boardstack_db::CardRow;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_card(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Json(req): Json<NewCard>,
) -> ApiResult<(StatusCode, Json<CardRow>)> {
    let card = card::create(&state.db, &board_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::CardCreated(card.clone()));
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, card_id)): Path<(String, String)>,
    Json(req): Json<CardUpdate>,
) -> ApiResult<Json<CardRow>> {
    let card = card::update(&state.db, &board_id, &card_id, &current.user.id, &req).await?;
    state.broadcast(&board_id, BoardEvent::CardUpdated(card.clone()));
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((board_id, card_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let card = card::delete(&state.db, &board_id, &card_id, &current.user.id).await?;
    state.broadcast(
        &board_id,
        BoardEvent::CardDeleted {
            id: card.id,
            parent_list: card.parent_list,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}
