//! One-shot messages carried in the session across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::ApiError;

const FLASHES_KEY: &str = "_flashes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Queue a flash for the next page the client loads.
pub async fn push(
    session: &Session,
    category: FlashCategory,
    message: impl Into<String>,
) -> Result<(), ApiError> {
    let mut flashes: Vec<Flash> = session
        .get(FLASHES_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or_default();

    flashes.push(Flash::new(category, message));

    session
        .insert(FLASHES_KEY, flashes)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Drain queued flashes.
pub async fn take(session: &Session) -> Result<Vec<Flash>, ApiError> {
    let flashes = session
        .remove::<Vec<Flash>>(FLASHES_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(flashes.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn flashes_drain_once_in_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push(&session, FlashCategory::Success, "Hello, testuser!")
            .await
            .unwrap();
        push(&session, FlashCategory::Danger, "Access unauthorized.")
            .await
            .unwrap();

        let flashes = take(&session).await.unwrap();
        assert_eq!(
            flashes,
            vec![
                Flash::new(FlashCategory::Success, "Hello, testuser!"),
                Flash::new(FlashCategory::Danger, "Access unauthorized."),
            ]
        );

        assert!(take(&session).await.unwrap().is_empty());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_value(Flash::new(FlashCategory::Danger, "x")).unwrap();
        assert_eq!(json["category"], "danger");
    }
}
