//! Activity route handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use boardstack_core::activity::{self, ActivityQuery, ActivityView};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_activity(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(board_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityView>>> {
    Ok(Json(
        activity::list(&state.db, &board_id, &current.user.id, &query).await?,
    ))
}
