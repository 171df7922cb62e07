//! Board labels.

use boardstack_db::{DbPool, LabelRow};
use chrono::Utc;
use uuid::Uuid;

use crate::access::{authorize, Permission};
use crate::activity::{self, Action};
use crate::board::{LabelUpdate, NewLabel};
use crate::error::{BoardError, BoardResult};
use crate::validation::{self, MAX_LABEL_LEN};

async fn label_in_board(pool: &DbPool, board_id: &str, label_id: &str) -> BoardResult<LabelRow> {
    match pool.get_label(label_id).await? {
        Some(label) if label.parent_board == board_id => Ok(label),
        _ => Err(BoardError::LabelNotFound(label_id.to_string())),
    }
}

pub async fn list(pool: &DbPool, board_id: &str, user_id: &str) -> BoardResult<Vec<LabelRow>> {
    authorize(pool, board_id, user_id, Permission::View).await?;
    Ok(pool.list_labels(board_id).await?)
}

pub async fn create(pool: &DbPool, board_id: &str, user_id: &str, input: &NewLabel) -> BoardResult<LabelRow> {
    let text = validation::bounded_text("label", &input.label, MAX_LABEL_LEN)?;
    let color = validation::normalize_color(&input.color)?;
    authorize(pool, board_id, user_id, Permission::Edit).await?;

    let label = LabelRow {
        id: Uuid::new_v4().to_string(),
        parent_board: board_id.to_string(),
        label: text,
        color,
        created_by: user_id.to_string(),
        created_at: Utc::now(),
    };
    pool.insert_label(&label).await?;
    Ok(label)
}

/// Rename or recolor a label. Each changed field is logged separately.
pub async fn update(
    pool: &DbPool,
    board_id: &str,
    label_id: &str,
    user_id: &str,
    changes: &LabelUpdate,
) -> BoardResult<LabelRow> {
    if changes.label.is_none() && changes.color.is_none() {
        return Err(BoardError::validation("one of label or color is required"));
    }
    authorize(pool, board_id, user_id, Permission::Edit).await?;
    let mut label = label_in_board(pool, board_id, label_id).await?;
    let mut log = Vec::new();

    if let Some(text) = &changes.label {
        let text = validation::bounded_text("label", text, MAX_LABEL_LEN)?;
        if text != label.label {
            log.push(activity::entry(
                board_id,
                user_id,
                Action::LabelLabelUpdated,
                Some(label.label.clone()),
                Some(text.clone()),
                Some(label_id),
            ));
            label.label = text;
        }
    }
    if let Some(color) = &changes.color {
        let color = validation::normalize_color(color)?;
        if color != label.color {
            log.push(activity::entry(
                board_id,
                user_id,
                Action::LabelColorUpdated,
                Some(label.color.clone()),
                Some(color.clone()),
                Some(label_id),
            ));
            label.color = color;
        }
    }

    if !log.is_empty() {
        pool.update_label(&label).await?;
        pool.insert_activity(&log).await?;
    }
    Ok(label)
}

/// Delete a label; cards carrying it lose it.
pub async fn delete(pool: &DbPool, board_id: &str, label_id: &str, user_id: &str) -> BoardResult<()> {
    authorize(pool, board_id, user_id, Permission::Edit).await?;
    label_in_board(pool, board_id, label_id).await?;
    pool.delete_label(label_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CardUpdate, NewCard, NewList};
    use crate::testing::{board, pool, user};
    use crate::{card, list as lists};
    use boardstack_db::ActivityFilter;

    fn new_label(text: &str, color: &str) -> NewLabel {
        NewLabel {
            label: text.to_string(),
            color: color.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_color() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let board_id = board(&pool, &owner).await;

        let label = create(&pool, &board_id, &owner, &new_label("bug", "F00")).await.unwrap();
        assert_eq!(label.color, "#f00");
        assert!(create(&pool, &board_id, &owner, &new_label("bug", "red")).await.is_err());
        assert!(create(&pool, &board_id, &owner, &new_label(&"l".repeat(21), "#fff"))
            .await
            .is_err());
        assert_eq!(list(&pool, &board_id, &owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_logs_label_and_color() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let board_id = board(&pool, &owner).await;
        let label = create(&pool, &board_id, &owner, &new_label("bug", "#f00")).await.unwrap();

        let updated = update(
            &pool,
            &board_id,
            &label.id,
            &owner,
            &LabelUpdate {
                label: Some("defect".to_string()),
                color: Some("#0f0".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.label, "defect");
        assert_eq!(updated.color, "#0f0");

        let filter = ActivityFilter {
            count: 10,
            ..Default::default()
        };
        let mut actions: Vec<String> = pool
            .list_activity(&board_id, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.action)
            .collect();
        actions.sort();
        assert_eq!(actions, vec!["label_color_updated", "label_label_updated"]);
    }

    #[tokio::test]
    async fn test_delete_detaches_from_cards() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let board_id = board(&pool, &owner).await;
        let label = create(&pool, &board_id, &owner, &new_label("bug", "#f00")).await.unwrap();
        let todo = lists::create(
            &pool,
            &board_id,
            &owner,
            &NewList {
                title: "Todo".to_string(),
            },
        )
        .await
        .unwrap();
        let c = card::create(
            &pool,
            &board_id,
            &owner,
            &NewCard {
                parent_list: todo.id.clone(),
                title: "A".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        card::update(
            &pool,
            &board_id,
            &c.id,
            &owner,
            &CardUpdate {
                labels: Some(vec![label.id.clone()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete(&pool, &board_id, &label.id, &owner).await.unwrap();

        assert!(pool.get_card(&c.id).await.unwrap().unwrap().labels.is_empty());
        let err = delete(&pool, &board_id, &label.id, &owner).await.unwrap_err();
        assert!(matches!(err, BoardError::LabelNotFound(_)));
    }
}
