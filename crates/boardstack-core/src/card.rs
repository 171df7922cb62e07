//! Cards: creation, edits, moves between positions and lists, deletion.

use boardstack_db::{CardRow, DbPool};
use chrono::Utc;
use uuid::Uuid;

use crate::access::{authorize, Permission};
use crate::board::{CardUpdate, NewCard};
use crate::error::{BoardError, BoardResult};
use crate::list::in_board;
use crate::position::{next_position, reorder};
use crate::validation;

/// Fetch a card and check it sits on `board_id`.
async fn card_in_board(pool: &DbPool, board_id: &str, card_id: &str) -> BoardResult<CardRow> {
    let card = pool
        .get_card(card_id)
        .await?
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;
    match in_board(pool, board_id, &card.parent_list).await {
        Ok(_) => Ok(card),
        Err(e) if e.is_not_found() => Err(BoardError::CardNotFound(card_id.to_string())),
        Err(e) => Err(e),
    }
}

/// Write `order` back as positions `0..n`, touching only cards that moved.
///
/// `moved` is the card being relocated; its row is taken from there rather
/// than from `cards`, since it may come from another list.
async fn apply_order(
    pool: &DbPool,
    list_id: &str,
    cards: &[CardRow],
    order: &[String],
    moved: &mut CardRow,
) -> BoardResult<()> {
    for (index, id) in order.iter().enumerate() {
        let position = index as i32;
        if *id == moved.id {
            moved.parent_list = list_id.to_string();
            moved.position = position;
            continue;
        }
        if let Some(card) = cards.iter().find(|c| c.id == *id) {
            if card.position != position {
                let mut card = card.clone();
                card.position = position;
                pool.update_card(&card).await?;
            }
        }
    }
    Ok(())
}

async fn check_labels(pool: &DbPool, board_id: &str, labels: &[String]) -> BoardResult<Vec<String>> {
    let known = pool.list_labels(board_id).await?;
    let mut result: Vec<String> = Vec::with_capacity(labels.len());
    for id in labels {
        if !known.iter().any(|l| l.id == *id) {
            return Err(BoardError::LabelNotFound(id.clone()));
        }
        if !result.contains(id) {
            result.push(id.clone());
        }
    }
    Ok(result)
}

/// Append a card to the end of a list.
pub async fn create(pool: &DbPool, board_id: &str, user_id: &str, input: &NewCard) -> BoardResult<CardRow> {
    let title = validation::title(&input.title)?;
    authorize(pool, board_id, user_id, Permission::Edit).await?;
    let list = in_board(pool, board_id, &input.parent_list).await?;

    let existing = pool.list_cards(&list.id).await?;
    let now = Utc::now();
    let card = CardRow {
        id: Uuid::new_v4().to_string(),
        parent_list: list.id,
        title,
        description: input.description.clone().filter(|d| !d.trim().is_empty()),
        position: next_position(existing.iter().map(|c| c.position)),
        labels: Vec::new(),
        created_by: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    pool.insert_card(&card).await?;
    Ok(card)
}

/// Edit a card. A new `position` or `parent_list` moves it, renumbering
/// the affected lists.
pub async fn update(
    pool: &DbPool,
    board_id: &str,
    card_id: &str,
    user_id: &str,
    changes: &CardUpdate,
) -> BoardResult<CardRow> {
    if changes.is_empty() {
        return Err(BoardError::validation("no card fields to update"));
    }
    authorize(pool, board_id, user_id, Permission::Edit).await?;
    let mut card = card_in_board(pool, board_id, card_id).await?;

    if let Some(title) = &changes.title {
        card.title = validation::title(title)?;
    }
    if let Some(description) = &changes.description {
        card.description = description.clone().filter(|d| !d.trim().is_empty());
    }
    if let Some(labels) = &changes.labels {
        card.labels = check_labels(pool, board_id, labels).await?;
    }

    let target_list = changes.parent_list.clone().unwrap_or_else(|| card.parent_list.clone());
    let moving_lists = target_list != card.parent_list;
    if moving_lists || changes.position.is_some() {
        if moving_lists {
            in_board(pool, board_id, &target_list).await?;
        }
        let source = pool.list_cards(&card.parent_list).await?;
        let source_ids: Vec<String> = source.iter().map(|c| c.id.clone()).collect();

        if moving_lists {
            let target = pool.list_cards(&target_list).await?;
            let target_ids: Vec<String> = target.iter().map(|c| c.id.clone()).collect();
            let index = changes.position.unwrap_or(target_ids.len());

            let source_order = reorder(&source_ids, &card.id, None);
            let target_order = reorder(&target_ids, &card.id, Some(index));
            let origin = card.parent_list.clone();
            apply_order(pool, &origin, &source, &source_order, &mut card).await?;
            apply_order(pool, &target_list, &target, &target_order, &mut card).await?;
        } else if let Some(index) = changes.position {
            let order = reorder(&source_ids, &card.id, Some(index));
            apply_order(pool, &target_list, &source, &order, &mut card).await?;
        }
    }

    card.updated_at = Utc::now();
    pool.update_card(&card).await?;
    Ok(card)
}

/// Delete a card and close the gap it leaves.
pub async fn delete(pool: &DbPool, board_id: &str, card_id: &str, user_id: &str) -> BoardResult<CardRow> {
    authorize(pool, board_id, user_id, Permission::Edit).await?;
    let mut card = card_in_board(pool, board_id, card_id).await?;
    pool.delete_card(card_id).await?;

    let siblings = pool.list_cards(&card.parent_list).await?;
    let order: Vec<String> = siblings.iter().map(|c| c.id.clone()).collect();
    let list_id = card.parent_list.clone();
    apply_order(pool, &list_id, &siblings, &order, &mut card).await?;
    Ok(card)
}
