//! Board audit trail.

use boardstack_db::{ActivityFilter, ActivityRow, DbPool};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::access::{authorize, Permission};
use crate::error::BoardResult;
use crate::user::{find_profile, UserProfile};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Recorded actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RenameBoard,
    UpdateBoardDescription,
    UpdateBoardBackground,
    ListCreated,
    LabelLabelUpdated,
    LabelColorUpdated,
    MemberRoleUpdated,
    InvitationAccepted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::RenameBoard => "rename_board",
            Action::UpdateBoardDescription => "update_board_description",
            Action::UpdateBoardBackground => "update_board_background",
            Action::ListCreated => "list_created",
            Action::LabelLabelUpdated => "label_label_updated",
            Action::LabelColorUpdated => "label_color_updated",
            Action::MemberRoleUpdated => "member_role_updated",
            Action::InvitationAccepted => "invitation_accepted",
        }
    }
}

/// Build one activity entry. `linked` names the record the change applies to.
pub(crate) fn entry(
    board_id: &str,
    user_id: &str,
    action: Action,
    old_value: Option<String>,
    new_value: Option<String>,
    linked: Option<&str>,
) -> ActivityRow {
    ActivityRow {
        id: Uuid::new_v4().to_string(),
        parent_board_id: board_id.to_string(),
        action: action.as_str().to_string(),
        created_by: user_id.to_string(),
        old_value,
        new_value,
        linked_value: linked.map(str::to_string),
        created_at: Utc::now(),
    }
}

/// Query parameters for [`list`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub action: Option<String>,
    pub created_by: Option<String>,
    pub start: Option<usize>,
    pub count: Option<usize>,
}

impl From<&ActivityQuery> for ActivityFilter {
    fn from(query: &ActivityQuery) -> Self {
        ActivityFilter {
            action: query.action.clone(),
            created_by: query.created_by.clone(),
            start: query.start.unwrap_or(0),
            count: query.count.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

/// An activity entry with its author.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: ActivityRow,
    pub user: Option<UserProfile>,
}

/// Activity of a board, newest first.
pub async fn list(
    pool: &DbPool,
    board_id: &str,
    user_id: &str,
    query: &ActivityQuery,
) -> BoardResult<Vec<ActivityView>> {
    authorize(pool, board_id, user_id, Permission::View).await?;
    let rows = pool.list_activity(board_id, &ActivityFilter::from(query)).await?;

    let mut authors: HashMap<String, Option<UserProfile>> = HashMap::new();
    let mut views = Vec::with_capacity(rows.len());
    for activity in rows {
        if !authors.contains_key(&activity.created_by) {
            let profile = find_profile(pool, &activity.created_by).await?;
            authors.insert(activity.created_by.clone(), profile);
        }
        let user = authors.get(&activity.created_by).cloned().flatten();
        views.push(ActivityView { activity, user });
    }
    Ok(views)
}
