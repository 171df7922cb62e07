//! Board membership.

use boardstack_db::{DbPool, MemberRole, MemberRow};
use tracing::info;

use crate::access::{authorize, Permission};
use crate::activity::{self, Action};
use crate::board::MemberView;
use crate::error::{BoardError, BoardResult};
use crate::user::find_profile;

pub(crate) async fn view(pool: &DbPool, row: MemberRow) -> BoardResult<MemberView> {
    let user = find_profile(pool, &row.user_id).await?;
    Ok(MemberView::new(row, user))
}

pub(crate) async fn views(pool: &DbPool, board_id: &str) -> BoardResult<Vec<MemberView>> {
    let mut views = Vec::new();
    for row in pool.list_members(board_id).await? {
        views.push(view(pool, row).await?);
    }
    Ok(views)
}

async fn member_in_board(pool: &DbPool, board_id: &str, member_id: &str) -> BoardResult<MemberRow> {
    pool.get_member(board_id, member_id)
        .await?
        .ok_or_else(|| BoardError::MemberNotFound(member_id.to_string()))
}

pub async fn list(pool: &DbPool, board_id: &str, user_id: &str) -> BoardResult<Vec<MemberView>> {
    authorize(pool, board_id, user_id, Permission::View).await?;
    views(pool, board_id).await
}

/// Change a member's role. Managers cannot change their own membership.
pub async fn update_role(
    pool: &DbPool,
    board_id: &str,
    member_id: &str,
    user_id: &str,
    role: MemberRole,
) -> BoardResult<MemberView> {
    authorize(pool, board_id, user_id, Permission::Manage).await?;
    let mut member = member_in_board(pool, board_id, member_id).await?;
    if member.user_id == user_id {
        return Err(BoardError::Forbidden);
    }

    if member.role != role {
        let old = member.role;
        member.role = role;
        pool.update_member(&member).await?;
        pool.insert_activity(&[activity::entry(
            board_id,
            user_id,
            Action::MemberRoleUpdated,
            Some(old.as_str().to_string()),
            Some(role.as_str().to_string()),
            Some(&member.user_id),
        )])
        .await?;
    }
    view(pool, member).await
}

/// Remove a member. Managers may remove anyone; members may leave.
pub async fn delete(pool: &DbPool, board_id: &str, member_id: &str, user_id: &str) -> BoardResult<MemberRow> {
    let access = authorize(pool, board_id, user_id, Permission::View).await?;
    let member = member_in_board(pool, board_id, member_id).await?;
    if member.user_id != user_id && !access.role.allows(Permission::Manage) {
        return Err(BoardError::Forbidden);
    }
    pool.delete_member(board_id, member_id).await?;
    info!(board = %board_id, member = %member.user_id, "Member removed");
    Ok(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_member, board, pool, user};
    use boardstack_db::ActivityFilter;

    #[tokio::test]
    async fn test_update_role_logs_and_returns_view() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let bob = user(&pool, "bob@example.com").await;
        let board_id = board(&pool, &owner).await;
        let member = add_member(&pool, &board_id, &bob, MemberRole::Reader).await;

        let view = update_role(&pool, &board_id, &member.id, &owner, MemberRole::Admin)
            .await
            .unwrap();
        assert_eq!(view.role, MemberRole::Admin);
        assert_eq!(view.user.unwrap().email, "bob@example.com");

        let filter = ActivityFilter {
            action: Some("member_role_updated".to_string()),
            count: 10,
            ..Default::default()
        };
        let log = pool.list_activity(&board_id, &filter).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].old_value.as_deref(), Some("reader"));
        assert_eq!(log[0].new_value.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_admin_cannot_change_own_role() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let admin = user(&pool, "admin@example.com").await;
        let board_id = board(&pool, &owner).await;
        let me = add_member(&pool, &board_id, &admin, MemberRole::Admin).await;

        let err = update_role(&pool, &board_id, &me.id, &admin, MemberRole::Reader)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Forbidden));
    }

    #[tokio::test]
    async fn test_delete_by_manager_or_self() {
        let pool = pool();
        let owner = user(&pool, "owner@example.com").await;
        let a = user(&pool, "a@example.com").await;
        let b = user(&pool, "b@example.com").await;
        let board_id = board(&pool, &owner).await;
        let ma = add_member(&pool, &board_id, &a, MemberRole::Member).await;
        let mb = add_member(&pool, &board_id, &b, MemberRole::Member).await;

        let err = delete(&pool, &board_id, &mb.id, &a).await.unwrap_err();
        assert!(matches!(err, BoardError::Forbidden));

        delete(&pool, &board_id, &ma.id, &a).await.unwrap();
        delete(&pool, &board_id, &mb.id, &owner).await.unwrap();
        assert!(list(&pool, &board_id, &owner).await.unwrap().is_empty());

        let err = delete(&pool, &board_id, &mb.id, &owner).await.unwrap_err();
        assert!(matches!(err, BoardError::MemberNotFound(_)));
    }
}
