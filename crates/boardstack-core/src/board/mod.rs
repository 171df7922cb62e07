//! Boards: creation, listing, detail view, settings and deletion.

pub mod model;

pub use model::{
    AcceptedInvitation, BoardPreview, BoardSummary, BoardUpdate, CardUpdate, DetailedBoard,
    InvitationPreview, InvitationView, LabelUpdate, ListWithCards, MemberView, NewBoard, NewCard,
    NewInvitation, NewLabel, NewList, DEFAULT_BACKGROUND,
};

use boardstack_db::{BackgroundType, BoardRow, DbPool};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access::{authorize, resolve, Permission};
use crate::activity::{self, Action};
use crate::error::{BoardError, BoardResult};
use crate::user::find_profile;
use crate::validation;
use crate::{invitation, member};

/// Check a background against its type. Colors are normalized.
fn checked_background(
    background: &str,
    background_type: BackgroundType,
    credits: Option<&str>,
) -> BoardResult<String> {
    match background_type {
        BackgroundType::Color => validation::normalize_color(background),
        BackgroundType::Image => {
            if credits.is_none_or(|c| c.trim().is_empty()) {
                return Err(BoardError::validation(
                    "image backgrounds require background_credits",
                ));
            }
            let url = background.trim();
            if url.is_empty() {
                return Err(BoardError::validation("background must not be empty"));
            }
            Ok(url.to_string())
        }
    }
}

/// Create a board owned by `user_id`.
pub async fn create(pool: &DbPool, user_id: &str, input: &NewBoard) -> BoardResult<BoardRow> {
    let title = validation::title(&input.title)?;
    let background_type = input.background_type.unwrap_or(BackgroundType::Color);
    let background = match input.background.as_deref() {
        Some(bg) => checked_background(bg, background_type, input.background_credits.as_deref())?,
        None if background_type == BackgroundType::Color => DEFAULT_BACKGROUND.to_string(),
        None => return Err(BoardError::validation("background is required for image boards")),
    };

    let now = Utc::now();
    let board = BoardRow {
        id: Uuid::new_v4().to_string(),
        title,
        description: input.description.clone().filter(|d| !d.trim().is_empty()),
        background,
        background_type,
        background_credits: input.background_credits.clone(),
        owner_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    pool.insert_board(&board).await?;
    info!(board = %board.id, owner = %user_id, "Board created");
    Ok(board)
}

/// Boards the user owns or belongs to, oldest first.
pub async fn list(pool: &DbPool, user_id: &str) -> BoardResult<Vec<BoardSummary>> {
    let boards = pool.list_boards_for_user(user_id).await?;
    let mut summaries = Vec::with_capacity(boards.len());
    for board in boards {
        let (board, role, _) = resolve(pool, &board.id, user_id).await?;
        if let Some(role) = role {
            summaries.push(BoardSummary { board, role });
        }
    }
    Ok(summaries)
}

/// The full board as seen by a viewer.
pub async fn get_detailed(pool: &DbPool, board_id: &str, user_id: &str) -> BoardResult<DetailedBoard> {
    let access = authorize(pool, board_id, user_id, Permission::View).await?;

    let mut lists = Vec::new();
    for list in pool.list_lists(board_id).await? {
        let cards = pool.list_cards(&list.id).await?;
        lists.push(ListWithCards { list, cards });
    }

    Ok(DetailedBoard {
        owner: find_profile(pool, &access.board.owner_id).await?,
        lists,
        labels: pool.list_labels(board_id).await?,
        members: member::views(pool, board_id).await?,
        invitations: invitation::views(pool, board_id).await?,
        current_user_role: access.role,
        board: access.board,
    })
}

/// Update board settings, logging one activity entry per changed aspect.
pub async fn update(
    pool: &DbPool,
    board_id: &str,
    user_id: &str,
    changes: &BoardUpdate,
) -> BoardResult<BoardRow> {
    if changes.title.is_none() && changes.description.is_none() && changes.background.is_none() {
        return Err(BoardError::validation(
            "one of title, description or background is required",
        ));
    }
    let access = authorize(pool, board_id, user_id, Permission::Manage).await?;
    let mut board = access.board.clone();
    let mut log = Vec::new();

    if let Some(title) = &changes.title {
        let title = validation::title(title)?;
        if title != board.title {
            log.push(activity::entry(
                board_id,
                user_id,
                Action::RenameBoard,
                Some(board.title.clone()),
                Some(title.clone()),
                None,
            ));
            board.title = title;
        }
    }

    if let Some(description) = &changes.description {
        let description = description.clone().filter(|d| !d.trim().is_empty());
        if description != board.description {
            log.push(activity::entry(
                board_id,
                user_id,
                Action::UpdateBoardDescription,
                board.description.clone(),
                description.clone(),
                None,
            ));
            board.description = description;
        }
    }

    if let Some(background) = &changes.background {
        let background_type = changes
            .background_type
            .ok_or_else(|| BoardError::validation("background requires background_type"))?;
        let background = checked_background(
            background,
            background_type,
            changes.background_credits.as_deref(),
        )?;
        if background != board.background || background_type != board.background_type {
            log.push(activity::entry(
                board_id,
                user_id,
                Action::UpdateBoardBackground,
                Some(board.background.clone()),
                Some(background.clone()),
                None,
            ));
        }
        board.background = background;
        board.background_type = background_type;
        board.background_credits = match background_type {
            BackgroundType::Image => changes.background_credits.clone(),
            BackgroundType::Color => None,
        };
    }

    if board == access.board {
        return Ok(board);
    }
    board.updated_at = Utc::now();
    pool.update_board(&board).await?;
    if !log.is_empty() {
        pool.insert_activity(&log).await?;
    }
    Ok(board)
}

/// Delete a board and everything on it. Owner only.
pub async fn delete(pool: &DbPool, board_id: &str, user_id: &str) -> BoardResult<()> {
    authorize(pool, board_id, user_id, Permission::Own).await?;
    pool.delete_board(board_id).await?;
    info!(board = %board_id, "Board deleted");
    Ok(())
}
