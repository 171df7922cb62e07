//! Server-sent event subscription for live board updates.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use boardstack_core::access::{authorize, Permission};
use boardstack_core::events::{ChannelId, SubscriberConnection};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeQuery {
    pub board_id: Option<String>,
}

/// Open a live stream of a board's events.
///
/// The caller is authenticated, the board looked up, and membership checked
/// before anything touches the registry. The stream stays open until the
/// client goes away or the server shuts down; either way the connection
/// leaves its channel exactly once.
pub async fn subscribe(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SubscribeQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let board_id = query
        .board_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("boardId is required"))?;
    authorize(&state.db, &board_id, &current.user.id, Permission::View).await?;

    let channel = ChannelId::board(&board_id);
    let (connection, stream) = SubscriberConnection::open(state.config.subscriber_buffer);
    let connection_id = connection.id();
    state.registry().add(channel.clone(), connection);
    info!(
        channel = %channel,
        connection = %connection_id,
        user = %current.user.id,
        "Client subscribed"
    );

    let events = stream.map(|payload| Ok(Event::default().data(payload)));
    let keep_alive = KeepAlive::new().interval(state.config.keep_alive_interval());
    Ok(Sse::new(events).keep_alive(keep_alive))
}
