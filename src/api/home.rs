use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth;
use super::flash;
use super::types::HomePage;
use super::{ApiError, ApiResponse, AppState};
use crate::db::PAGE_LIMIT;
use crate::models::user::UserSummary;

/// GET /
/// Timeline of the user and everyone they follow, newest first. Anonymous
/// visitors get the landing marker.
pub async fn homepage(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<HomePage>>, ApiError> {
    let page = match auth::current_user(&state, &session).await? {
        Some(user) => {
            let messages = state.store().timeline(user.id, PAGE_LIMIT).await?;
            let messages = state.store().with_authors(messages, Some(user.id)).await?;

            HomePage::Timeline {
                user: UserSummary::from(&user),
                messages,
            }
        }
        None => HomePage::Anonymous { anonymous: true },
    };

    let flashes = flash::take(&session).await?;

    Ok(Json(ApiResponse::success(page).with_flashes(flashes)))
}
