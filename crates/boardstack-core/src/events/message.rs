//! Events published on board channels.

use boardstack_db::{BoardRow, CardRow, LabelRow, ListRow};
use serde::{Deserialize, Serialize};

use crate::board::model::{InvitationView, MemberView};

/// A mutation visible to board viewers, sent as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BoardEvent {
    CardCreated(CardRow),
    CardUpdated(CardRow),
    CardDeleted { id: String, parent_list: String },
    ListCreated(ListRow),
    LabelCreated(LabelRow),
    LabelUpdated(LabelRow),
    LabelDeleted(String),
    BoardUpdated(BoardRow),
    MemberCreated(MemberView),
    MemberUpdated(MemberView),
    MemberDeleted(String),
    InvitationCreated(InvitationView),
    InvitationUpdated(InvitationView),
    InvitationDeleted(String),
}

impl BoardEvent {
    /// Wire name of this event's `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            BoardEvent::CardCreated(_) => "card_created",
            BoardEvent::CardUpdated(_) => "card_updated",
            BoardEvent::CardDeleted { .. } => "card_deleted",
            BoardEvent::ListCreated(_) => "list_created",
            BoardEvent::LabelCreated(_) => "label_created",
            BoardEvent::LabelUpdated(_) => "label_updated",
            BoardEvent::LabelDeleted(_) => "label_deleted",
            BoardEvent::BoardUpdated(_) => "board_updated",
            BoardEvent::MemberCreated(_) => "member_created",
            BoardEvent::MemberUpdated(_) => "member_updated",
            BoardEvent::MemberDeleted(_) => "member_deleted",
            BoardEvent::InvitationCreated(_) => "invitation_created",
            BoardEvent::InvitationUpdated(_) => "invitation_updated",
            BoardEvent::InvitationDeleted(_) => "invitation_deleted",
        }
    }
}

/// Body accepted by the internal publish endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub channel: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_kind_matches_serialized_type() {
        let now = Utc::now();
        let events = vec![
            BoardEvent::ListCreated(ListRow {
                id: "l1".to_string(),
                parent_board: "b1".to_string(),
                title: "Todo".to_string(),
                position: 0,
                created_by: "u1".to_string(),
                created_at: now,
            }),
            BoardEvent::LabelDeleted("lb1".to_string()),
            BoardEvent::MemberDeleted("m1".to_string()),
            BoardEvent::InvitationDeleted("i1".to_string()),
            BoardEvent::CardDeleted {
                id: "c1".to_string(),
                parent_list: "l1".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
            assert!(json.get("data").is_some());
        }
    }

    #[test]
    fn test_deleted_payload_is_bare_id() {
        let json = serde_json::to_value(BoardEvent::LabelDeleted("lb1".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "label_deleted", "data": "lb1"}));
    }
}
