//! In-process store backed by hash maps.
//!
//! Used for development servers and tests. State lives for the life of the
//! process and is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use crate::rows::{
    ActivityFilter, ActivityRow, BoardRow, CardRow, InvitationRow, LabelRow, ListRow, MemberRow,
    UserRow,
};
use crate::store::BoardStore;

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRow>,
    boards: HashMap<String, BoardRow>,
    lists: HashMap<String, ListRow>,
    cards: HashMap<String, CardRow>,
    labels: HashMap<String, LabelRow>,
    members: HashMap<String, MemberRow>,
    invitations: HashMap<String, InvitationRow>,
    activity: Vec<ActivityRow>,
}

/// A [`BoardStore`] kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T>(map: &mut HashMap<String, T>, id: &str, row: &T, kind: &str) -> DbResult<()>
where
    T: Clone,
{
    match map.get_mut(id) {
        Some(slot) => {
            *slot = row.clone();
            Ok(())
        }
        None => Err(DbError::NotFound(format!("{}: {}", kind, id))),
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn insert_user(&self, user: &UserRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_board(&self, board: &BoardRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.boards.insert(board.id.clone(), board.clone());
        Ok(())
    }

    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>> {
        Ok(self.tables.read().await.boards.get(id).cloned())
    }

    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>> {
        let t = self.tables.read().await;
        let mut boards: Vec<BoardRow> = t
            .boards
            .values()
            .filter(|b| {
                b.owner_id == user_id
                    || t.members
                        .values()
                        .any(|m| m.parent_board == b.id && m.user_id == user_id)
            })
            .cloned()
            .collect();
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(boards)
    }

    async fn update_board(&self, board: &BoardRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.boards, &board.id, board, "Board")
    }

    async fn delete_board(&self, id: &str) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.boards.remove(id);

        let list_ids: Vec<String> = t
            .lists
            .values()
            .filter(|l| l.parent_board == id)
            .map(|l| l.id.clone())
            .collect();
        t.cards.retain(|_, c| !list_ids.contains(&c.parent_list));
        t.lists.retain(|_, l| l.parent_board != id);
        t.labels.retain(|_, l| l.parent_board != id);
        t.members.retain(|_, m| m.parent_board != id);
        t.invitations.retain(|_, i| i.parent_board != id);
        t.activity.retain(|a| a.parent_board_id != id);
        Ok(())
    }

    async fn insert_list(&self, list: &ListRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.lists.insert(list.id.clone(), list.clone());
        Ok(())
    }

    async fn get_list(&self, id: &str) -> DbResult<Option<ListRow>> {
        Ok(self.tables.read().await.lists.get(id).cloned())
    }

    async fn list_lists(&self, board_id: &str) -> DbResult<Vec<ListRow>> {
        let t = self.tables.read().await;
        let mut lists: Vec<ListRow> = t
            .lists
            .values()
            .filter(|l| l.parent_board == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| (l.position, l.created_at));
        Ok(lists)
    }

    async fn insert_card(&self, card: &CardRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.cards.insert(card.id.clone(), card.clone());
        Ok(())
    }

    async fn get_card(&self, id: &str) -> DbResult<Option<CardRow>> {
        Ok(self.tables.read().await.cards.get(id).cloned())
    }

    async fn list_cards(&self, list_id: &str) -> DbResult<Vec<CardRow>> {
        let t = self.tables.read().await;
        let mut cards: Vec<CardRow> = t
            .cards
            .values()
            .filter(|c| c.parent_list == list_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| (c.position, c.created_at));
        Ok(cards)
    }

    async fn update_card(&self, card: &CardRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.cards, &card.id, card, "Card")
    }

    async fn delete_card(&self, id: &str) -> DbResult<()> {
        self.tables.write().await.cards.remove(id);
        Ok(())
    }

    async fn insert_label(&self, label: &LabelRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.labels.insert(label.id.clone(), label.clone());
        Ok(())
    }

    async fn get_label(&self, id: &str) -> DbResult<Option<LabelRow>> {
        Ok(self.tables.read().await.labels.get(id).cloned())
    }

    async fn list_labels(&self, board_id: &str) -> DbResult<Vec<LabelRow>> {
        let t = self.tables.read().await;
        let mut labels: Vec<LabelRow> = t
            .labels
            .values()
            .filter(|l| l.parent_board == board_id)
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(labels)
    }

    async fn update_label(&self, label: &LabelRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.labels, &label.id, label, "Label")
    }

    async fn delete_label(&self, id: &str) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.labels.remove(id);
        for card in t.cards.values_mut() {
            card.labels.retain(|l| l != id);
        }
        Ok(())
    }

    async fn insert_member(&self, member: &MemberRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.members.insert(member.id.clone(), member.clone());
        Ok(())
    }

    async fn get_member(&self, board_id: &str, id: &str) -> DbResult<Option<MemberRow>> {
        let t = self.tables.read().await;
        Ok(t.members
            .get(id)
            .filter(|m| m.parent_board == board_id)
            .cloned())
    }

    async fn list_members(&self, board_id: &str) -> DbResult<Vec<MemberRow>> {
        let t = self.tables.read().await;
        let mut members: Vec<MemberRow> = t
            .members
            .values()
            .filter(|m| m.parent_board == board_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn update_member(&self, member: &MemberRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.members, &member.id, member, "Member")
    }

    async fn delete_member(&self, board_id: &str, id: &str) -> DbResult<()> {
        let mut t = self.tables.write().await;
        if t.members.get(id).is_some_and(|m| m.parent_board == board_id) {
            t.members.remove(id);
        }
        Ok(())
    }

    async fn insert_invitation(&self, invitation: &InvitationRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.invitations
            .insert(invitation.id.clone(), invitation.clone());
        Ok(())
    }

    async fn get_invitation(&self, id: &str) -> DbResult<Option<InvitationRow>> {
        Ok(self.tables.read().await.invitations.get(id).cloned())
    }

    async fn find_invitation(
        &self,
        board_id: &str,
        email: &str,
    ) -> DbResult<Option<InvitationRow>> {
        let t = self.tables.read().await;
        Ok(t.invitations
            .values()
            .find(|i| i.parent_board == board_id && i.email == email)
            .cloned())
    }

    async fn list_invitations(&self, board_id: &str) -> DbResult<Vec<InvitationRow>> {
        let t = self.tables.read().await;
        let mut invitations: Vec<InvitationRow> = t
            .invitations
            .values()
            .filter(|i| i.parent_board == board_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(invitations)
    }

    async fn update_invitation(&self, invitation: &InvitationRow) -> DbResult<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.invitations, &invitation.id, invitation, "Invitation")
    }

    async fn delete_invitation(&self, id: &str) -> DbResult<()> {
        self.tables.write().await.invitations.remove(id);
        Ok(())
    }

    async fn delete_invitations_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let mut t = self.tables.write().await;
        let before = t.invitations.len();
        t.invitations.retain(|_, i| i.created_at >= cutoff);
        Ok((before - t.invitations.len()) as u64)
    }

    async fn insert_activity(&self, entries: &[ActivityRow]) -> DbResult<()> {
        let mut t = self.tables.write().await;
        t.activity.extend_from_slice(entries);
        Ok(())
    }

    async fn list_activity(
        &self,
        board_id: &str,
        filter: &ActivityFilter,
    ) -> DbResult<Vec<ActivityRow>> {
        let t = self.tables.read().await;
        let rows = t
            .activity
            .iter()
            .filter(|a| a.parent_board_id == board_id)
            .cloned()
            .collect();
        Ok(filter.apply(rows))
    }
}
