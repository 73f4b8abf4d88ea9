//! `SeaORM` implementation of the `MessageService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::message::{MAX_MESSAGE_LEN, Message};
use crate::services::message_service::{MessageError, MessageService};

pub struct SeaOrmMessageService {
    store: Store,
}

impl SeaOrmMessageService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require_message(&self, message_id: i32) -> Result<Message, MessageError> {
        self.store
            .get_message(message_id)
            .await?
            .ok_or(MessageError::NotFound(message_id))
    }
}

fn validate_text(text: &str) -> Result<&str, MessageError> {
    if text.trim().is_empty() {
        return Err(MessageError::Validation(
            "Message text cannot be empty".to_string(),
        ));
    }

    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(MessageError::Validation(format!(
            "Message text must be {MAX_MESSAGE_LEN} characters or less"
        )));
    }

    Ok(text)
}

#[async_trait]
impl MessageService for SeaOrmMessageService {
    async fn create_message(&self, user_id: i32, text: &str) -> Result<Message, MessageError> {
        let text = validate_text(text)?;
        let message = self.store.create_message(user_id, text).await?;

        info!(user_id, message_id = message.id, "Message posted");
        Ok(message)
    }

    async fn delete_message(&self, user_id: i32, message_id: i32) -> Result<(), MessageError> {
        let message = self.require_message(message_id).await?;

        if message.user_id != user_id {
            return Err(MessageError::NotOwner {
                message_id,
                user_id,
            });
        }

        self.store.delete_message(message_id).await?;
        info!(user_id, message_id, "Message deleted");
        Ok(())
    }

    async fn set_like(
        &self,
        user_id: i32,
        message_id: i32,
        liked: bool,
    ) -> Result<bool, MessageError> {
        self.require_message(message_id).await?;

        let changed = if liked {
            self.store.add_like(user_id, message_id).await?
        } else {
            self.store.remove_like(user_id, message_id).await?
        };

        if changed {
            info!(user_id, message_id, liked, "Like updated");
        }
        Ok(liked)
    }

    async fn remove_like(&self, user_id: i32, message_id: i32) -> Result<(), MessageError> {
        if !self.store.remove_like(user_id, message_id).await? {
            return Err(MessageError::LikeNotFound {
                user_id,
                message_id,
            });
        }
        Ok(())
    }

    async fn get_liked_msg_ids(&self, messages: &[Message]) -> Result<Vec<i32>, MessageError> {
        Ok(self.store.get_liked_msg_ids(messages).await?)
    }
}
