//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Precise conflict for a username/email that belongs to someone other than `user_id`.
    async fn check_identity_free(
        &self,
        username: &str,
        email: &str,
        user_id: Option<i32>,
    ) -> Result<(), UserError> {
        let is_other = |found: Option<User>| found.is_some_and(|u| Some(u.id) != user_id);

        if is_other(self.store.get_user_by_username(username).await?) {
            return Err(UserError::UsernameTaken);
        }
        if is_other(self.store.get_user_by_email(email).await?) {
            return Err(UserError::EmailTaken);
        }
        Ok(())
    }
}

/// A unique-constraint failure that slipped past the pre-check (concurrent signup).
fn map_unique_violation(err: anyhow::Error) -> UserError {
    match err.downcast_ref::<DbErr>().and_then(DbErr::sql_err) {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::AlreadyTaken,
        _ => UserError::from(err),
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn signup(&self, new_user: NewUser) -> Result<User, UserError> {
        self.check_identity_free(&new_user.username, &new_user.email, None)
            .await?;

        let user = self
            .store
            .create_user(new_user, &self.security)
            .await
            .map_err(map_unique_violation)?;

        info!(user_id = user.id, username = %user.username, "User signed up");
        Ok(user)
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(self.store.verify_user_password(username, password).await?)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        password: &str,
        update: ProfileUpdate,
    ) -> Result<User, UserError> {
        let current = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        // Re-authenticate against the stored name, not the submitted one.
        if self
            .store
            .verify_user_password(&current.username, password)
            .await?
            .is_none()
        {
            return Err(UserError::InvalidCredentials);
        }

        self.check_identity_free(&update.username, &update.email, Some(user_id))
            .await?;

        let user = self
            .store
            .update_user_profile(user_id, update)
            .await
            .map_err(map_unique_violation)?
            .ok_or(UserError::NotFound(user_id))?;

        info!(user_id, "Profile updated");
        Ok(user)
    }

    async fn delete_user(&self, user_id: i32) -> Result<(), UserError> {
        if !self.store.delete_user(user_id).await? {
            return Err(UserError::NotFound(user_id));
        }

        info!(user_id, "User deleted");
        Ok(())
    }

    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError> {
        if follower_id == followed_id {
            return Err(UserError::SelfFollow);
        }

        if self.store.get_user(followed_id).await?.is_none() {
            return Err(UserError::NotFound(followed_id));
        }

        if self.store.follow(follower_id, followed_id).await? {
            info!(follower_id, followed_id, "Followed user");
        }
        Ok(())
    }

    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool, UserError> {
        let removed = self.store.unfollow(follower_id, followed_id).await?;
        if removed {
            info!(follower_id, followed_id, "Unfollowed user");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_constraint_errors_stay_internal() {
        let err = anyhow::Error::new(DbErr::Custom("boom".to_string()));
        assert!(matches!(map_unique_violation(err), UserError::Internal(_)));
    }

    async fn spawn_store() -> (Store, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "warbler-user-service-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        (store, path)
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "password".to_string(),
            image_url: None,
        }
    }

    fn cheap_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[tokio::test]
    async fn duplicate_insert_maps_to_already_taken() {
        let (store, path) = spawn_store().await;
        let security = cheap_security();

        store
            .create_user(new_user("testuser", "a@test.com"), &security)
            .await
            .unwrap();

        let err = store
            .create_user(new_user("testuser", "b@test.com"), &security)
            .await
            .unwrap_err();
        assert!(matches!(map_unique_violation(err), UserError::AlreadyTaken));

        let err = store
            .create_user(new_user("other", "a@test.com"), &security)
            .await
            .unwrap_err();
        assert!(matches!(map_unique_violation(err), UserError::AlreadyTaken));

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn duplicate_profile_update_maps_to_already_taken() {
        let (store, path) = spawn_store().await;
        let security = cheap_security();

        store
            .create_user(new_user("first", "first@test.com"), &security)
            .await
            .unwrap();
        let second = store
            .create_user(new_user("second", "second@test.com"), &security)
            .await
            .unwrap();

        let err = store
            .update_user_profile(
                second.id,
                ProfileUpdate {
                    username: "first".to_string(),
                    email: "second@test.com".to_string(),
                    image_url: None,
                    header_image_url: None,
                    bio: None,
                    location: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(map_unique_violation(err), UserError::AlreadyTaken));

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn error_conversions_work() {
        let db_err = DbErr::Custom("test".to_string());
        let user_err: UserError = db_err.into();
        assert!(matches!(user_err, UserError::Database(_)));
    }
}
