use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::entities::{follows, likes, messages, users};
use crate::models::message::{Message, MessageEntry, now_timestamp};
use crate::models::user::UserSummary;

/// Repository for message rows and the listings built from them
pub struct MessageRepository {
    conn: DatabaseConnection,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, text: &str) -> Result<Message> {
        let active = messages::ActiveModel {
            text: Set(text.to_string()),
            timestamp: Set(now_timestamp()),
            user_id: Set(user_id),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert message")?;

        Ok(Message::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Message>> {
        let row = messages::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query message")?;

        Ok(row.map(Message::from))
    }

    /// Delete a message and its likes in one transaction.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        likes::Entity::delete_many()
            .filter(likes::Column::MessageId.eq(id))
            .exec(&txn)
            .await?;

        let result = messages::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(messages::Entity::find().count(&self.conn).await?)
    }

    /// Newest first.
    pub async fn for_user(&self, user_id: i32, limit: u64) -> Result<Vec<Message>> {
        let rows = messages::Entity::find()
            .filter(messages::Column::UserId.eq(user_id))
            .order_by_desc(messages::Column::Timestamp)
            .order_by_desc(messages::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list messages for user")?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Messages by `user_id` and everyone they follow, newest first.
    pub async fn timeline(&self, user_id: i32, limit: u64) -> Result<Vec<Message>> {
        let mut author_ids: Vec<i32> = follows::Entity::find()
            .select_only()
            .column(follows::Column::UserBeingFollowedId)
            .filter(follows::Column::UserFollowingId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load followed users")?;
        author_ids.push(user_id);

        let rows = messages::Entity::find()
            .filter(messages::Column::UserId.is_in(author_ids))
            .order_by_desc(messages::Column::Timestamp)
            .order_by_desc(messages::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to load timeline")?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Messages liked by `user_id`, most recently posted first.
    pub async fn liked_by(&self, user_id: i32) -> Result<Vec<Message>> {
        let rows = messages::Entity::find()
            .inner_join(likes::Entity)
            .filter(likes::Column::UserId.eq(user_id))
            .order_by_desc(messages::Column::Timestamp)
            .order_by_desc(messages::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list liked messages")?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Ids among `message_ids` that carry at least one like, sorted.
    pub async fn liked_ids(&self, message_ids: &[i32]) -> Result<Vec<i32>> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = likes::Entity::find()
            .select_only()
            .column(likes::Column::MessageId)
            .filter(likes::Column::MessageId.is_in(message_ids.iter().copied()))
            .distinct()
            .order_by_asc(likes::Column::MessageId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query liked message ids")?;

        Ok(ids)
    }

    /// Ids among `message_ids` that `user_id` has liked.
    pub async fn liked_ids_for_user(
        &self,
        user_id: i32,
        message_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if message_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = likes::Entity::find()
            .select_only()
            .column(likes::Column::MessageId)
            .filter(likes::Column::UserId.eq(user_id))
            .filter(likes::Column::MessageId.is_in(message_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query user's liked message ids")?;

        Ok(ids.into_iter().collect())
    }

    /// Attach authors and the viewer's like markers to a page of messages.
    pub async fn with_authors(
        &self,
        messages: Vec<Message>,
        viewer_id: Option<i32>,
    ) -> Result<Vec<MessageEntry>> {
        let author_ids: HashSet<i32> = messages.iter().map(|m| m.user_id).collect();
        let authors: HashMap<i32, UserSummary> = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(&self.conn)
            .await
            .context("Failed to load message authors")?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();

        let liked = match viewer_id {
            Some(viewer) => {
                let ids: Vec<i32> = messages.iter().map(|m| m.id).collect();
                self.liked_ids_for_user(viewer, &ids).await?
            }
            None => HashSet::new(),
        };

        Ok(messages
            .into_iter()
            .filter_map(|message| {
                let author = authors.get(&message.user_id)?.clone();
                let liked = liked.contains(&message.id);
                Some(MessageEntry {
                    message,
                    author,
                    liked,
                })
            })
            .collect())
    }
}
