//! Board domain models: request inputs and composed views.

use boardstack_db::{
    BackgroundType, BoardRow, CardRow, InvitationRow, LabelRow, ListRow, MemberRole, MemberRow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::access::Role;
use crate::user::UserProfile;

pub const DEFAULT_BACKGROUND: &str = "#0079bf";

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBoard {
    pub title: String,
    pub description: Option<String>,
    pub background: Option<String>,
    pub background_type: Option<BackgroundType>,
    pub background_credits: Option<String>,
}

/// Partial board update. `description: null` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub background: Option<String>,
    pub background_type: Option<BackgroundType>,
    pub background_credits: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewList {
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCard {
    pub parent_list: String,
    pub title: String,
    pub description: Option<String>,
}

/// Partial card update. Setting `parent_list` or `position` moves the card.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub labels: Option<Vec<String>>,
    pub position: Option<usize>,
    pub parent_list: Option<String>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.labels.is_none()
            && self.position.is_none()
            && self.parent_list.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLabel {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelUpdate {
    pub label: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvitation {
    pub email: String,
    pub role: MemberRole,
}

/// A board in the caller's board list.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    #[serde(flatten)]
    pub board: BoardRow,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: ListRow,
    pub cards: Vec<CardRow>,
}

/// A member row joined with the member's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub id: String,
    pub parent_board: String,
    pub user_id: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserProfile>,
}

impl MemberView {
    pub fn new(row: MemberRow, user: Option<UserProfile>) -> Self {
        Self {
            id: row.id,
            parent_board: row.parent_board,
            user_id: row.user_id,
            role: row.role,
            created_at: row.created_at,
            user,
        }
    }
}

/// An invitation joined with the inviter's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: InvitationRow,
    pub invited_by: Option<UserProfile>,
}

/// Everything a client needs to render one board.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedBoard {
    #[serde(flatten)]
    pub board: BoardRow,
    pub owner: Option<UserProfile>,
    pub lists: Vec<ListWithCards>,
    pub labels: Vec<LabelRow>,
    pub members: Vec<MemberView>,
    pub invitations: Vec<InvitationView>,
    pub current_user_role: Role,
}

/// The part of a board an invitee may see before accepting.
#[derive(Debug, Clone, Serialize)]
pub struct BoardPreview {
    pub id: String,
    pub title: String,
    pub background: String,
    pub background_type: BackgroundType,
}

impl From<&BoardRow> for BoardPreview {
    fn from(board: &BoardRow) -> Self {
        Self {
            id: board.id.clone(),
            title: board.title.clone(),
            background: board.background.clone(),
            background_type: board.background_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationPreview {
    #[serde(flatten)]
    pub invitation: InvitationRow,
    pub board: BoardPreview,
    pub invited_by: Option<UserProfile>,
}

/// Result of accepting an invitation.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedInvitation {
    pub member: MemberView,
    pub invitation_id: String,
}
