use serde::{Deserialize, Serialize};

use crate::entities::{likes, messages};
use crate::models::user::UserSummary;

/// Upper bound on message length, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub text: String,
    pub timestamp: String,
    pub user_id: i32,
}

impl From<messages::Model> for Message {
    fn from(model: messages::Model) -> Self {
        Self {
            id: model.id,
            text: model.text,
            timestamp: model.timestamp,
            user_id: model.user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
    pub user_id: i32,
    pub message_id: i32,
}

impl From<likes::Model> for Like {
    fn from(model: likes::Model) -> Self {
        Self {
            user_id: model.user_id,
            message_id: model.message_id,
        }
    }
}

/// A message together with its author, as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEntry {
    #[serde(flatten)]
    pub message: Message,
    pub author: UserSummary,
    pub liked: bool,
}

/// Current UTC time in the stored timestamp format.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
