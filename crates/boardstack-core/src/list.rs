//! Lists on a board.

use boardstack_db::{DbPool, ListRow};
use chrono::Utc;
use uuid::Uuid;

use crate::access::{authorize, Permission};
use crate::activity::{self, Action};
use crate::board::NewList;
use crate::error::{BoardError, BoardResult};
use crate::position::next_position;
use crate::validation;

/// Append a list after the board's last list.
pub async fn create(pool: &DbPool, board_id: &str, user_id: &str, input: &NewList) -> BoardResult<ListRow> {
    let title = validation::title(&input.title)?;
    authorize(pool, board_id, user_id, Permission::Edit).await?;

    let existing = pool.list_lists(board_id).await?;
    let list = ListRow {
        id: Uuid::new_v4().to_string(),
        parent_board: board_id.to_string(),
        title,
        position: next_position(existing.iter().map(|l| l.position)),
        created_by: user_id.to_string(),
        created_at: Utc::now(),
    };
    pool.insert_list(&list).await?;
    pool.insert_activity(&[activity::entry(
        board_id,
        user_id,
        Action::ListCreated,
        None,
        Some(list.title.clone()),
        Some(&list.id),
    )])
    .await?;
    Ok(list)
}

/// Fetch a list and check it sits on `board_id`.
pub(crate) async fn in_board(pool: &DbPool, board_id: &str, list_id: &str) -> BoardResult<ListRow> {
    match pool.get_list(list_id).await? {
        Some(list) if list.parent_board == board_id => Ok(list),
        _ => Err(BoardError::ListNotFound(list_id.to_string())),
    }
}
