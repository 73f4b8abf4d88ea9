use serde::{Deserialize, Serialize};

use crate::api::flash::Flash;
use crate::forms::FormErrors;
use crate::models::message::{Message, MessageEntry};
use crate::models::user::{User, UserStats, UserSummary};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FormErrors>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
            flashes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
            flashes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: FormErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_flashes(mut self, flashes: Vec<Flash>) -> Self {
        self.flashes = flashes;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HomePage {
    Timeline {
        user: UserSummary,
        messages: Vec<MessageEntry>,
    },
    Anonymous {
        anonymous: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct UserListDto {
    pub query: Option<String>,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub user: User,
    pub stats: UserStats,
    pub messages: Vec<MessageEntry>,
    /// Whether the viewer follows this user; `None` for anonymous viewers.
    pub is_followed_by_viewer: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FollowListDto {
    pub user: UserSummary,
    pub relation: &'static str,
    pub users: Vec<FollowEntryDto>,
}

#[derive(Debug, Serialize)]
pub struct FollowEntryDto {
    #[serde(flatten)]
    pub user: UserSummary,
    pub bio: Option<String>,
    /// Whether the viewer follows this user
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct LikesDto {
    pub user: UserSummary,
    pub messages: Vec<MessageEntry>,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    #[serde(flatten)]
    pub message: Message,
    pub author: UserSummary,
    pub like_count: u64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
