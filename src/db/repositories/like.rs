use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::entities::likes;
use crate::models::message::Like;

/// Repository for (user, message) like rows
pub struct LikeRepository {
    conn: DatabaseConnection,
}

impl LikeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Add-if-absent. Returns whether a row was added.
    pub async fn add(&self, user_id: i32, message_id: i32) -> Result<bool> {
        let active = likes::ActiveModel {
            user_id: Set(user_id),
            message_id: Set(message_id),
        };

        let inserted = likes::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([likes::Column::UserId, likes::Column::MessageId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert like")?;

        Ok(inserted > 0)
    }

    /// Remove-if-present. Returns whether a row was removed.
    pub async fn remove(&self, user_id: i32, message_id: i32) -> Result<bool> {
        let result = likes::Entity::delete_by_id((user_id, message_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete like")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn get(&self, user_id: i32, message_id: i32) -> Result<Option<Like>> {
        let row = likes::Entity::find_by_id((user_id, message_id))
            .one(&self.conn)
            .await
            .context("Failed to query like")?;

        Ok(row.map(Like::from))
    }

    pub async fn for_message(&self, message_id: i32) -> Result<Vec<Like>> {
        let rows = likes::Entity::find()
            .filter(likes::Column::MessageId.eq(message_id))
            .all(&self.conn)
            .await
            .context("Failed to list likes for message")?;

        Ok(rows.into_iter().map(Like::from).collect())
    }

    pub async fn for_user(&self, user_id: i32) -> Result<Vec<Like>> {
        let rows = likes::Entity::find()
            .filter(likes::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list likes for user")?;

        Ok(rows.into_iter().map(Like::from).collect())
    }

    pub async fn count_for_message(&self, message_id: i32) -> Result<u64> {
        Ok(likes::Entity::find()
            .filter(likes::Column::MessageId.eq(message_id))
            .count(&self.conn)
            .await?)
    }
}
