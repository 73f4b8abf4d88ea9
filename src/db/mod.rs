use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{GeneralConfig, SecurityConfig};
use crate::models::message::{Like, Message, MessageEntry};
use crate::models::user::{NewUser, ProfileUpdate, User, UserStats};

pub mod migrator;
pub mod repositories;

/// Most messages shown on a profile or timeline page.
pub const PAGE_LIMIT: u64 = 100;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn from_config(config: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &config.database_url,
            config.max_db_connections,
            config.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn message_repo(&self) -> repositories::message::MessageRepository {
        repositories::message::MessageRepository::new(self.conn.clone())
    }

    fn follow_repo(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    fn like_repo(&self) -> repositories::like::LikeRepository {
        repositories::like::LikeRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>> {
        self.user_repo().list(search).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<Option<User>> {
        self.user_repo().update_profile(id, update).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn user_stats(&self, id: i32) -> Result<UserStats> {
        self.user_repo().stats(id).await
    }

    // ========== Follows ==========

    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.follow_repo().follow(follower_id, followed_id).await
    }

    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.follow_repo().unfollow(follower_id, followed_id).await
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.follow_repo()
            .is_following(follower_id, followed_id)
            .await
    }

    pub async fn following(&self, user_id: i32) -> Result<Vec<User>> {
        self.follow_repo().following(user_id).await
    }

    pub async fn followers(&self, user_id: i32) -> Result<Vec<User>> {
        self.follow_repo().followers(user_id).await
    }

    // ========== Messages ==========

    pub async fn create_message(&self, user_id: i32, text: &str) -> Result<Message> {
        self.message_repo().create(user_id, text).await
    }

    pub async fn get_message(&self, id: i32) -> Result<Option<Message>> {
        self.message_repo().get(id).await
    }

    pub async fn delete_message(&self, id: i32) -> Result<bool> {
        self.message_repo().delete(id).await
    }

    pub async fn count_messages(&self) -> Result<u64> {
        self.message_repo().count().await
    }

    pub async fn messages_for_user(&self, user_id: i32, limit: u64) -> Result<Vec<Message>> {
        self.message_repo().for_user(user_id, limit).await
    }

    pub async fn timeline(&self, user_id: i32, limit: u64) -> Result<Vec<Message>> {
        self.message_repo().timeline(user_id, limit).await
    }

    pub async fn liked_messages(&self, user_id: i32) -> Result<Vec<Message>> {
        self.message_repo().liked_by(user_id).await
    }

    /// Ids of the given messages that have at least one like.
    pub async fn get_liked_msg_ids(&self, messages: &[Message]) -> Result<Vec<i32>> {
        let ids: Vec<i32> = messages.iter().map(|m| m.id).collect();
        self.message_repo().liked_ids(&ids).await
    }

    pub async fn liked_message_ids_for(
        &self,
        user_id: i32,
        message_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        self.message_repo()
            .liked_ids_for_user(user_id, message_ids)
            .await
    }

    pub async fn with_authors(
        &self,
        messages: Vec<Message>,
        viewer_id: Option<i32>,
    ) -> Result<Vec<MessageEntry>> {
        self.message_repo().with_authors(messages, viewer_id).await
    }

    // ========== Likes ==========

    pub async fn add_like(&self, user_id: i32, message_id: i32) -> Result<bool> {
        self.like_repo().add(user_id, message_id).await
    }

    pub async fn remove_like(&self, user_id: i32, message_id: i32) -> Result<bool> {
        self.like_repo().remove(user_id, message_id).await
    }

    pub async fn get_like(&self, user_id: i32, message_id: i32) -> Result<Option<Like>> {
        self.like_repo().get(user_id, message_id).await
    }

    pub async fn likes_for_message(&self, message_id: i32) -> Result<Vec<Like>> {
        self.like_repo().for_message(message_id).await
    }

    pub async fn likes_for_user(&self, user_id: i32) -> Result<Vec<Like>> {
        self.like_repo().for_user(user_id).await
    }

    pub async fn like_count(&self, message_id: i32) -> Result<u64> {
        self.like_repo().count_for_message(message_id).await
    }
}
