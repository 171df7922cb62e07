//! Record types persisted by the store.
//!
//! Field names follow the wire format the web client consumes, so rows are
//! serialized as-is into API responses and real-time events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role granted to a board member or carried by an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Reader,
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Reader => "reader",
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }
}

/// How a board background is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Color,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub background: String,
    pub background_type: BackgroundType,
    pub background_credits: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub parent_board: String,
    pub title: String,
    pub position: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: String,
    pub parent_list: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    /// Ids of the labels attached to this card.
    pub labels: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub id: String,
    pub parent_board: String,
    pub label: String,
    pub color: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: String,
    pub parent_board: String,
    pub user_id: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationRow {
    pub id: String,
    pub parent_board: String,
    pub email: String,
    pub role: MemberRole,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    pub parent_board_id: String,
    pub action: String,
    pub created_by: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub linked_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter and window for activity queries. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub action: Option<String>,
    pub created_by: Option<String>,
    pub start: usize,
    pub count: usize,
}

impl ActivityFilter {
    pub fn matches(&self, row: &ActivityRow) -> bool {
        self.action.as_deref().is_none_or(|a| a == row.action)
            && self
                .created_by
                .as_deref()
                .is_none_or(|c| c == row.created_by)
    }

    /// Sort newest first and cut the requested window.
    pub fn apply(&self, mut rows: Vec<ActivityRow>) -> Vec<ActivityRow> {
        rows.retain(|r| self.matches(r));
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().skip(self.start).take(self.count).collect()
    }
}
