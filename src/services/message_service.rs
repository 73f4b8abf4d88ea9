//! Domain service for messages and likes.

use thiserror::Error;

use crate::models::message::Message;

/// Errors specific to message operations.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message {0} not found")]
    NotFound(i32),

    #[error("Message {message_id} is not owned by user {user_id}")]
    NotOwner { message_id: i32, user_id: i32 },

    #[error("User {user_id} has not liked message {message_id}")]
    LikeNotFound { user_id: i32, message_id: i32 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MessageError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MessageError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for messages.
#[async_trait::async_trait]
pub trait MessageService: Send + Sync {
    /// Posts a message owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Validation`] for blank or over-long text.
    async fn create_message(&self, user_id: i32, text: &str) -> Result<Message, MessageError>;

    /// Deletes a message on behalf of `user_id`, who must own it.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::NotOwner`] when someone else wrote it.
    async fn delete_message(&self, user_id: i32, message_id: i32) -> Result<(), MessageError>;

    /// Set-membership form of liking: `liked = true` adds the like if absent,
    /// `false` removes it if present. Returns the resulting state.
    async fn set_like(
        &self,
        user_id: i32,
        message_id: i32,
        liked: bool,
    ) -> Result<bool, MessageError>;

    /// Removes an existing like.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::LikeNotFound`] if there was nothing to remove.
    async fn remove_like(&self, user_id: i32, message_id: i32) -> Result<(), MessageError>;

    /// Ids among `messages` that have at least one like.
    async fn get_liked_msg_ids(&self, messages: &[Message]) -> Result<Vec<i32>, MessageError>;
}
