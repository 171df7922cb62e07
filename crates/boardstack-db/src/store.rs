//! The storage seam used by the domain layer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::rows::{
    ActivityFilter, ActivityRow, BoardRow, CardRow, InvitationRow, LabelRow, ListRow, MemberRow,
    UserRow,
};

/// Create/read/update/delete access to BoardStack records.
///
/// `update_*` calls replace the stored record wholesale and fail with
/// [`DbError::NotFound`](crate::DbError::NotFound) when it does not exist.
/// Lists and cards come back ordered by `position`.
#[async_trait]
pub trait BoardStore: Send + Sync {
    // users
    async fn insert_user(&self, user: &UserRow) -> DbResult<()>;
    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>>;
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    // boards
    async fn insert_board(&self, board: &BoardRow) -> DbResult<()>;
    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>>;
    /// Boards owned by `user_id` or where they hold a membership.
    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>>;
    async fn update_board(&self, board: &BoardRow) -> DbResult<()>;
    /// Deletes the board and everything that hangs off it.
    async fn delete_board(&self, id: &str) -> DbResult<()>;

    // lists
    async fn insert_list(&self, list: &ListRow) -> DbResult<()>;
    async fn get_list(&self, id: &str) -> DbResult<Option<ListRow>>;
    async fn list_lists(&self, board_id: &str) -> DbResult<Vec<ListRow>>;

    // cards
    async fn insert_card(&self, card: &CardRow) -> DbResult<()>;
    async fn get_card(&self, id: &str) -> DbResult<Option<CardRow>>;
    async fn list_cards(&self, list_id: &str) -> DbResult<Vec<CardRow>>;
    async fn update_card(&self, card: &CardRow) -> DbResult<()>;
    async fn delete_card(&self, id: &str) -> DbResult<()>;

    // labels
    async fn insert_label(&self, label: &LabelRow) -> DbResult<()>;
    async fn get_label(&self, id: &str) -> DbResult<Option<LabelRow>>;
    async fn list_labels(&self, board_id: &str) -> DbResult<Vec<LabelRow>>;
    async fn update_label(&self, label: &LabelRow) -> DbResult<()>;
    /// Deletes the label and detaches it from every card of its board.
    async fn delete_label(&self, id: &str) -> DbResult<()>;

    // members
    async fn insert_member(&self, member: &MemberRow) -> DbResult<()>;
    async fn get_member(&self, board_id: &str, id: &str) -> DbResult<Option<MemberRow>>;
    async fn list_members(&self, board_id: &str) -> DbResult<Vec<MemberRow>>;
    async fn update_member(&self, member: &MemberRow) -> DbResult<()>;
    async fn delete_member(&self, board_id: &str, id: &str) -> DbResult<()>;

    // invitations
    async fn insert_invitation(&self, invitation: &InvitationRow) -> DbResult<()>;
    async fn get_invitation(&self, id: &str) -> DbResult<Option<InvitationRow>>;
    async fn find_invitation(&self, board_id: &str, email: &str)
        -> DbResult<Option<InvitationRow>>;
    async fn list_invitations(&self, board_id: &str) -> DbResult<Vec<InvitationRow>>;
    async fn update_invitation(&self, invitation: &InvitationRow) -> DbResult<()>;
    async fn delete_invitation(&self, id: &str) -> DbResult<()>;
    /// Deletes every invitation created before `cutoff`, returning how many went.
    async fn delete_invitations_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;

    // activity
    async fn insert_activity(&self, entries: &[ActivityRow]) -> DbResult<()>;
    async fn list_activity(
        &self,
        board_id: &str,
        filter: &ActivityFilter,
    ) -> DbResult<Vec<ActivityRow>>;
}

/// Shared handle to whichever store backend is configured.
pub type DbPool = Arc<dyn BoardStore>;
