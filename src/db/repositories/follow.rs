use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::entities::{follows, users};
use crate::models::user::User;

/// Repository for the directed follower graph
pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the edge unless it already exists. Returns whether a row was added.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let active = follows::ActiveModel {
            user_being_followed_id: Set(followed_id),
            user_following_id: Set(follower_id),
        };

        let inserted = follows::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    follows::Column::UserBeingFollowedId,
                    follows::Column::UserFollowingId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert follow")?;

        Ok(inserted > 0)
    }

    /// Remove the edge if present. Returns whether a row was removed.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let result = follows::Entity::delete_many()
            .filter(follows::Column::UserBeingFollowedId.eq(followed_id))
            .filter(follows::Column::UserFollowingId.eq(follower_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete follow")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let edge = follows::Entity::find_by_id((followed_id, follower_id))
            .one(&self.conn)
            .await
            .context("Failed to query follow")?;

        Ok(edge.is_some())
    }

    /// Users that `user_id` follows, ordered by username.
    pub async fn following(&self, user_id: i32) -> Result<Vec<User>> {
        let ids: Vec<i32> = follows::Entity::find()
            .select_only()
            .column(follows::Column::UserBeingFollowedId)
            .filter(follows::Column::UserFollowingId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query following")?;

        self.users_by_ids(ids).await
    }

    /// Users following `user_id`, ordered by username.
    pub async fn followers(&self, user_id: i32) -> Result<Vec<User>> {
        let ids: Vec<i32> = follows::Entity::find()
            .select_only()
            .column(follows::Column::UserFollowingId)
            .filter(follows::Column::UserBeingFollowedId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query followers")?;

        self.users_by_ids(ids).await
    }

    async fn users_by_ids(&self, ids: Vec<i32>) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
