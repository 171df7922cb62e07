//! Role-based access to boards.

use boardstack_db::{BoardRow, DbPool, MemberRole, MemberRow};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Effective role of a user on a board. The owner is not a member row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Member,
    Admin,
    Owner,
}

/// What an operation needs from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Owner or any member.
    View,
    /// Owner or any member except readers.
    Edit,
    /// Owner or admins.
    Manage,
    /// Owner only.
    Own,
}

impl Role {
    pub fn allows(self, permission: Permission) -> bool {
        match permission {
            Permission::View => true,
            Permission::Edit => self != Role::Reader,
            Permission::Manage => matches!(self, Role::Admin | Role::Owner),
            Permission::Own => self == Role::Owner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl From<MemberRole> for Role {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Reader => Role::Reader,
            MemberRole::Member => Role::Member,
            MemberRole::Admin => Role::Admin,
        }
    }
}

/// A board together with the caller's standing on it.
#[derive(Debug, Clone)]
pub struct BoardAccess {
    pub board: BoardRow,
    pub role: Role,
    /// The caller's member row; `None` for the owner.
    pub membership: Option<MemberRow>,
}

/// Load a board and the caller's role on it, `None` when unrelated.
pub async fn resolve(
    pool: &DbPool,
    board_id: &str,
    user_id: &str,
) -> BoardResult<(BoardRow, Option<Role>, Option<MemberRow>)> {
    let board = pool
        .get_board(board_id)
        .await?
        .ok_or_else(|| BoardError::BoardNotFound(board_id.to_string()))?;

    if board.owner_id == user_id {
        return Ok((board, Some(Role::Owner), None));
    }

    let membership = pool
        .list_members(board_id)
        .await?
        .into_iter()
        .find(|m| m.user_id == user_id);
    let role = membership.as_ref().map(|m| Role::from(m.role));
    Ok((board, role, membership))
}

/// Load a board and check that `user_id` holds `permission` on it.
///
/// Fails with `BoardNotFound` before any membership check, then with
/// `Forbidden` when the caller is not related to the board or their role is
/// too low.
pub async fn authorize(
    pool: &DbPool,
    board_id: &str,
    user_id: &str,
    permission: Permission,
) -> BoardResult<BoardAccess> {
    match resolve(pool, board_id, user_id).await? {
        (board, Some(role), membership) if role.allows(permission) => Ok(BoardAccess {
            board,
            role,
            membership,
        }),
        _ => Err(BoardError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardstack_db::{BackgroundType, MemoryStore};
    use chrono::Utc;
    use std::sync::Arc;

    async fn seeded() -> DbPool {
        let pool: DbPool = Arc::new(MemoryStore::new());
        let now = Utc::now();
        pool.insert_board(&BoardRow {
            id: "b1".to_string(),
            title: "Roadmap".to_string(),
            description: None,
            background: "#0079bf".to_string(),
            background_type: BackgroundType::Color,
            background_credits: None,
            owner_id: "owner".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        for (id, user, role) in [
            ("m1", "reader", MemberRole::Reader),
            ("m2", "member", MemberRole::Member),
            ("m3", "admin", MemberRole::Admin),
        ] {
            pool.insert_member(&MemberRow {
                id: id.to_string(),
                parent_board: "b1".to_string(),
                user_id: user.to_string(),
                role,
                created_at: now,
            })
            .await
            .unwrap();
        }
        pool
    }

    #[test]
    fn test_permission_tiers() {
        assert!(Role::Reader.allows(Permission::View));
        assert!(!Role::Reader.allows(Permission::Edit));
        assert!(Role::Member.allows(Permission::Edit));
        assert!(!Role::Member.allows(Permission::Manage));
        assert!(Role::Admin.allows(Permission::Manage));
        assert!(!Role::Admin.allows(Permission::Own));
        assert!(Role::Owner.allows(Permission::Own));
    }

    #[tokio::test]
    async fn test_authorize_owner_and_members() {
        let pool = seeded().await;

        let owner = authorize(&pool, "b1", "owner", Permission::Own).await.unwrap();
        assert_eq!(owner.role, Role::Owner);
        assert!(owner.membership.is_none());

        let reader = authorize(&pool, "b1", "reader", Permission::View).await.unwrap();
        assert_eq!(reader.role, Role::Reader);
        assert_eq!(reader.membership.unwrap().id, "m1");

        assert!(authorize(&pool, "b1", "admin", Permission::Manage).await.is_ok());
    }

    #[tokio::test]
    async fn test_authorize_rejections() {
        let pool = seeded().await;

        let err = authorize(&pool, "missing", "owner", Permission::View).await.unwrap_err();
        assert!(matches!(err, BoardError::BoardNotFound(_)));

        let err = authorize(&pool, "b1", "stranger", Permission::View).await.unwrap_err();
        assert!(matches!(err, BoardError::Forbidden));

        let err = authorize(&pool, "b1", "reader", Permission::Edit).await.unwrap_err();
        assert!(matches!(err, BoardError::Forbidden));

        let err = authorize(&pool, "b1", "member", Permission::Manage).await.unwrap_err();
        assert!(matches!(err, BoardError::Forbidden));
    }
}
