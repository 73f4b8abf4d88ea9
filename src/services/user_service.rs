//! Domain service for accounts and the follower graph.
//!
//! Handles signup, credential checks, profile edits, account deletion and
//! follow/unfollow.

use thiserror::Error;

use crate::models::user::{NewUser, ProfileUpdate, User};

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already taken")]
    EmailTaken,

    #[error("Username or email already taken")]
    AlreadyTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User {0} not found")]
    NotFound(i32),

    #[error("Users cannot follow themselves")]
    SelfFollow,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for users.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::UsernameTaken`] / [`UserError::EmailTaken`] when
    /// either identity is already in use.
    async fn signup(&self, new_user: NewUser) -> Result<User, UserError>;

    /// Returns the user when the password verifies, `None` otherwise.
    /// Bad credentials are not an error.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<Option<User>, UserError>;

    /// Re-checks `password` for the user, then replaces their profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] if the password is wrong.
    async fn update_profile(
        &self,
        user_id: i32,
        password: &str,
        update: ProfileUpdate,
    ) -> Result<User, UserError>;

    /// Deletes the user along with their messages, likes and follow edges.
    async fn delete_user(&self, user_id: i32) -> Result<(), UserError>;

    /// Makes `follower_id` follow `followed_id`. Following twice is a no-op.
    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError>;

    /// Returns whether an edge was removed.
    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool, UserError>;
}
