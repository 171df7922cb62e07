//! Redis-backed store.
//!
//! Every record is a JSON blob in the `data` field of a hash keyed
//! `bs:{kind}:{id}`. Secondary indexes are plain sets; board activity is a list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};
use crate::rows::{
    ActivityFilter, ActivityRow, BoardRow, CardRow, InvitationRow, LabelRow, ListRow, MemberRow,
    UserRow,
};
use crate::store::BoardStore;

fn record_key(kind: &str, id: &str) -> String {
    format!("bs:{}:{}", kind, id)
}

fn user_boards_key(user_id: &str) -> String {
    format!("bs:user:{}:boards", user_id)
}

fn user_email_key(email: &str) -> String {
    format!("bs:users:email:{}", email)
}

fn board_index_key(board_id: &str, kind: &str) -> String {
    format!("bs:board:{}:{}", board_id, kind)
}

fn list_cards_key(list_id: &str) -> String {
    format!("bs:list:{}:cards", list_id)
}

const ALL_INVITATIONS_KEY: &str = "bs:invitations:all";

/// A [`BoardStore`] persisted in Redis.
///
/// `ConnectionManager` multiplexes internally and is `Clone`, so each
/// operation clones it to get a mutable handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// Example URL: `redis://127.0.0.1:6379`
    pub async fn connect(redis_url: &str) -> DbResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(redis_url = %redis_url, "Connected to Redis store");
        Ok(Self { conn })
    }

    async fn put<T: Serialize + Sync>(&self, kind: &str, id: &str, row: &T) -> DbResult<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(record_key(kind, id), "data", serde_json::to_string(row)?)
            .await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, kind: &str, id: &str) -> DbResult<Option<T>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.hget(record_key(kind, id), "data").await?;
        match json {
            Some(j) => Ok(Some(serde_json::from_str(&j)?)),
            None => Ok(None),
        }
    }

    async fn fetch_indexed<T: DeserializeOwned>(
        &self,
        kind: &str,
        index_key: &str,
    ) -> DbResult<Vec<T>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(index_key).await?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = self.fetch(kind, &id).await? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn replace<T: Serialize + Sync>(&self, kind: &str, id: &str, row: &T) -> DbResult<()> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(record_key(kind, id)).await?;
        if !exists {
            return Err(DbError::NotFound(format!("{}: {}", kind, id)));
        }
        self.put(kind, id, row).await
    }

    async fn drop_record(&self, kind: &str, id: &str) -> DbResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(record_key(kind, id)).await?;
        Ok(())
    }
}

#[async_trait]
impl BoardStore for RedisStore {
    async fn insert_user(&self, user: &UserRow) -> DbResult<()> {
        self.put("user", &user.id, user).await?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(user_email_key(&user.email), &user.id)
            .await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> DbResult<Option<UserRow>> {
        self.fetch("user", id).await
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(user_email_key(email)).await?;
        match id {
            Some(id) => self.fetch("user", &id).await,
            None => Ok(None),
        }
    }

    async fn insert_board(&self, board: &BoardRow) -> DbResult<()> {
        self.put("board", &board.id, board).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(user_boards_key(&board.owner_id), &board.id)
            .await?;
        Ok(())
    }

    async fn get_board(&self, id: &str) -> DbResult<Option<BoardRow>> {
        self.fetch("board", id).await
    }

    async fn list_boards_for_user(&self, user_id: &str) -> DbResult<Vec<BoardRow>> {
        let mut boards: Vec<BoardRow> = self
            .fetch_indexed("board", &user_boards_key(user_id))
            .await?;
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(boards)
    }

    async fn update_board(&self, board: &BoardRow) -> DbResult<()> {
        self.replace("board", &board.id, board).await
    }

    async fn delete_board(&self, id: &str) -> DbResult<()> {
        let Some(board) = self.get_board(id).await? else {
            return Ok(());
        };
        let mut conn = self.conn.clone();

        for list in self.list_lists(id).await? {
            let card_ids: Vec<String> = conn.smembers(list_cards_key(&list.id)).await?;
            for card_id in card_ids {
                self.drop_record("card", &card_id).await?;
            }
            conn.del::<_, ()>(list_cards_key(&list.id)).await?;
            self.drop_record("list", &list.id).await?;
        }
        for label in self.list_labels(id).await? {
            self.drop_record("label", &label.id).await?;
        }
        for member in self.list_members(id).await? {
            conn.srem::<_, _, ()>(user_boards_key(&member.user_id), id)
                .await?;
            self.drop_record("member", &member.id).await?;
        }
        for invitation in self.list_invitations(id).await? {
            conn.srem::<_, _, ()>(ALL_INVITATIONS_KEY, &invitation.id)
                .await?;
            self.drop_record("invitation", &invitation.id).await?;
        }
        for kind in ["lists", "labels", "members", "invitations", "activity"] {
            conn.del::<_, ()>(board_index_key(id, kind)).await?;
        }
        conn.srem::<_, _, ()>(user_boards_key(&board.owner_id), id)
            .await?;
        self.drop_record("board", id).await
    }

    async fn insert_list(&self, list: &ListRow) -> DbResult<()> {
        self.put("list", &list.id, list).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(board_index_key(&list.parent_board, "lists"), &list.id)
            .await?;
        Ok(())
    }

    async fn get_list(&self, id: &str) -> DbResult<Option<ListRow>> {
        self.fetch("list", id).await
    }

    async fn list_lists(&self, board_id: &str) -> DbResult<Vec<ListRow>> {
        let mut lists: Vec<ListRow> = self
            .fetch_indexed("list", &board_index_key(board_id, "lists"))
            .await?;
        lists.sort_by_key(|l| (l.position, l.created_at));
        Ok(lists)
    }

    async fn insert_card(&self, card: &CardRow) -> DbResult<()> {
        self.put("card", &card.id, card).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(list_cards_key(&card.parent_list), &card.id)
            .await?;
        Ok(())
    }

    async fn get_card(&self, id: &str) -> DbResult<Option<CardRow>> {
        self.fetch("card", id).await
    }

    async fn list_cards(&self, list_id: &str) -> DbResult<Vec<CardRow>> {
        let mut cards: Vec<CardRow> = self.fetch_indexed("card", &list_cards_key(list_id)).await?;
        // Index and record are separate writes; the record wins.
        cards.retain(|c| c.parent_list == list_id);
        cards.sort_by_key(|c| (c.position, c.created_at));
        Ok(cards)
    }

    async fn update_card(&self, card: &CardRow) -> DbResult<()> {
        let previous: Option<CardRow> = self.fetch("card", &card.id).await?;
        let Some(previous) = previous else {
            return Err(DbError::NotFound(format!("card: {}", card.id)));
        };
        self.put("card", &card.id, card).await?;
        if previous.parent_list != card.parent_list {
            let mut conn = self.conn.clone();
            conn.srem::<_, _, ()>(list_cards_key(&previous.parent_list), &card.id)
                .await?;
            conn.sadd::<_, _, ()>(list_cards_key(&card.parent_list), &card.id)
                .await?;
        }
        Ok(())
    }

    async fn delete_card(&self, id: &str) -> DbResult<()> {
        if let Some(card) = self.get_card(id).await? {
            let mut conn = self.conn.clone();
            conn.srem::<_, _, ()>(list_cards_key(&card.parent_list), id)
                .await?;
        }
        self.drop_record("card", id).await
    }

    async fn insert_label(&self, label: &LabelRow) -> DbResult<()> {
        self.put("label", &label.id, label).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(board_index_key(&label.parent_board, "labels"), &label.id)
            .await?;
        Ok(())
    }

    async fn get_label(&self, id: &str) -> DbResult<Option<LabelRow>> {
        self.fetch("label", id).await
    }

    async fn list_labels(&self, board_id: &str) -> DbResult<Vec<LabelRow>> {
        let mut labels: Vec<LabelRow> = self
            .fetch_indexed("label", &board_index_key(board_id, "labels"))
            .await?;
        labels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(labels)
    }

    async fn update_label(&self, label: &LabelRow) -> DbResult<()> {
        self.replace("label", &label.id, label).await
    }

    async fn delete_label(&self, id: &str) -> DbResult<()> {
        let Some(label) = self.get_label(id).await? else {
            return Ok(());
        };
        for list in self.list_lists(&label.parent_board).await? {
            for mut card in self.list_cards(&list.id).await? {
                if card.labels.iter().any(|l| l == id) {
                    card.labels.retain(|l| l != id);
                    self.put("card", &card.id, &card).await?;
                }
            }
        }
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(board_index_key(&label.parent_board, "labels"), id)
            .await?;
        self.drop_record("label", id).await
    }

    async fn insert_member(&self, member: &MemberRow) -> DbResult<()> {
        self.put("member", &member.id, member).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(board_index_key(&member.parent_board, "members"), &member.id)
            .await?;
        conn.sadd::<_, _, ()>(user_boards_key(&member.user_id), &member.parent_board)
            .await?;
        Ok(())
    }

    async fn get_member(&self, board_id: &str, id: &str) -> DbResult<Option<MemberRow>> {
        let member: Option<MemberRow> = self.fetch("member", id).await?;
        Ok(member.filter(|m| m.parent_board == board_id))
    }

    async fn list_members(&self, board_id: &str) -> DbResult<Vec<MemberRow>> {
        let mut members: Vec<MemberRow> = self
            .fetch_indexed("member", &board_index_key(board_id, "members"))
            .await?;
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn update_member(&self, member: &MemberRow) -> DbResult<()> {
        self.replace("member", &member.id, member).await
    }

    async fn delete_member(&self, board_id: &str, id: &str) -> DbResult<()> {
        let Some(member) = self.get_member(board_id, id).await? else {
            return Ok(());
        };
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(board_index_key(board_id, "members"), id)
            .await?;
        conn.srem::<_, _, ()>(user_boards_key(&member.user_id), board_id)
            .await?;
        self.drop_record("member", id).await
    }

    async fn insert_invitation(&self, invitation: &InvitationRow) -> DbResult<()> {
        self.put("invitation", &invitation.id, invitation).await?;
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(
            board_index_key(&invitation.parent_board, "invitations"),
            &invitation.id,
        )
        .await?;
        conn.sadd::<_, _, ()>(ALL_INVITATIONS_KEY, &invitation.id)
            .await?;
        Ok(())
    }

    async fn get_invitation(&self, id: &str) -> DbResult<Option<InvitationRow>> {
        self.fetch("invitation", id).await
    }

    async fn find_invitation(
        &self,
        board_id: &str,
        email: &str,
    ) -> DbResult<Option<InvitationRow>> {
        let invitations = self.list_invitations(board_id).await?;
        Ok(invitations.into_iter().find(|i| i.email == email))
    }

    async fn list_invitations(&self, board_id: &str) -> DbResult<Vec<InvitationRow>> {
        let mut invitations: Vec<InvitationRow> = self
            .fetch_indexed("invitation", &board_index_key(board_id, "invitations"))
            .await?;
        invitations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(invitations)
    }

    async fn update_invitation(&self, invitation: &InvitationRow) -> DbResult<()> {
        self.replace("invitation", &invitation.id, invitation).await
    }

    async fn delete_invitation(&self, id: &str) -> DbResult<()> {
        if let Some(invitation) = self.get_invitation(id).await? {
            let mut conn = self.conn.clone();
            conn.srem::<_, _, ()>(
                board_index_key(&invitation.parent_board, "invitations"),
                id,
            )
            .await?;
            conn.srem::<_, _, ()>(ALL_INVITATIONS_KEY, id).await?;
        }
        self.drop_record("invitation", id).await
    }

    async fn delete_invitations_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let all: Vec<InvitationRow> = self.fetch_indexed("invitation", ALL_INVITATIONS_KEY).await?;
        let mut removed = 0;
        for invitation in all.into_iter().filter(|i| i.created_at < cutoff) {
            self.delete_invitation(&invitation.id).await?;
            removed += 1;
        }
        Ok(removed)
    }

    async fn insert_activity(&self, entries: &[ActivityRow]) -> DbResult<()> {
        let mut conn = self.conn.clone();
        for entry in entries {
            conn.rpush::<_, _, ()>(
                board_index_key(&entry.parent_board_id, "activity"),
                serde_json::to_string(entry)?,
            )
            .await?;
        }
        Ok(())
    }

    async fn list_activity(
        &self,
        board_id: &str,
        filter: &ActivityFilter,
    ) -> DbResult<Vec<ActivityRow>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(board_index_key(board_id, "activity"), 0, -1)
            .await?;
        let rows = raw
            .iter()
            .map(|j| serde_json::from_str(j))
            .collect::<Result<Vec<ActivityRow>, _>>()?;
        Ok(filter.apply(rows))
    }
}
