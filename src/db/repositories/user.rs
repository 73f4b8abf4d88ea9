use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{follows, likes, messages, users};
use crate::models::message::now_timestamp;
use crate::models::user::{
    DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, NewUser, ProfileUpdate, User, UserStats,
};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Hash the password and insert the user.
    ///
    /// Unique-constraint violations come back as the underlying `DbErr`
    /// so callers can tell them apart from other failures.
    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = new_user.password;
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let image_url = new_user
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            image_url: Set(image_url),
            header_image_url: Set(DEFAULT_HEADER_IMAGE_URL.to_string()),
            bio: Set(None),
            location: Set(None),
            password: Set(password_hash),
            created_at: Set(now_timestamp()),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(User::from(model))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Users ordered by username, optionally filtered by a case-sensitive
    /// username substring. `%` and `_` match literally.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Username);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(Expr::cust_with_values("instr(username, ?) > 0", [term]));
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Returns the user if `password` verifies against the stored hash.
    /// Argon2 is CPU-intensive, so verification runs on a blocking thread.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some((user, password_hash)) = self.get_by_username_with_password(username).await?
        else {
            return Ok(None);
        };

        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then_some(user))
    }

    /// Overwrite the editable profile columns. Returns `None` if the user is gone.
    pub async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.username = Set(update.username);
        active.email = Set(update.email);
        active.image_url = Set(update
            .image_url
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()));
        active.header_image_url = Set(update
            .header_image_url
            .unwrap_or_else(|| DEFAULT_HEADER_IMAGE_URL.to_string()));
        active.bio = Set(update.bio);
        active.location = Set(update.location);

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    /// Delete a user and everything hanging off it in one transaction.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let message_ids: Vec<i32> = messages::Entity::find()
            .select_only()
            .column(messages::Column::Id)
            .filter(messages::Column::UserId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        likes::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(likes::Column::UserId.eq(id))
                    .add(likes::Column::MessageId.is_in(message_ids)),
            )
            .exec(&txn)
            .await?;

        follows::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(follows::Column::UserBeingFollowedId.eq(id))
                    .add(follows::Column::UserFollowingId.eq(id)),
            )
            .exec(&txn)
            .await?;

        messages::Entity::delete_many()
            .filter(messages::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = users::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn stats(&self, id: i32) -> Result<UserStats> {
        let messages = messages::Entity::find()
            .filter(messages::Column::UserId.eq(id))
            .count(&self.conn)
            .await?;
        let followers = follows::Entity::find()
            .filter(follows::Column::UserBeingFollowedId.eq(id))
            .count(&self.conn)
            .await?;
        let following = follows::Entity::find()
            .filter(follows::Column::UserFollowingId.eq(id))
            .count(&self.conn)
            .await?;
        let likes = likes::Entity::find()
            .filter(likes::Column::UserId.eq(id))
            .count(&self.conn)
            .await?;

        Ok(UserStats {
            messages,
            followers,
            following,
            likes,
        })
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };

        let first = hash_password("pass123", Some(&config)).unwrap();
        let second = hash_password("pass123", Some(&config)).unwrap();

        assert_ne!(first, "pass123");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"pass123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrongpass", &parsed)
                .is_err()
        );
    }
}
