use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{self, CurrentUser};
use super::flash::{self, FlashCategory};
use super::types::{
    FollowEntryDto, FollowListDto, LikesDto, ProfileDto, SearchQuery, UserListDto,
};
use super::validation::{normalize_search_query, validate_user_id};
use super::{ApiError, ApiResponse, AppState, redirect};
use crate::db::PAGE_LIMIT;
use crate::forms::{self, EditUserForm};
use crate::models::user::{ProfileUpdate, User, UserSummary};
use crate::services::UserError;

/// GET /users?q=
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<UserListDto>>, ApiError> {
    let search = normalize_search_query(query.q.as_deref())?;
    let users = state.store().list_users(search.as_deref()).await?;

    Ok(Json(ApiResponse::success(UserListDto {
        query: search,
        users: users.iter().map(UserSummary::from).collect(),
    })))
}

/// GET /users/{id}
pub async fn show_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let id = validate_user_id(id)?;
    let user = require_user(&state, id).await?;
    let viewer = auth::current_user(&state, &session).await?;
    let viewer_id = viewer.as_ref().map(|v| v.id);

    let messages = state.store().messages_for_user(id, PAGE_LIMIT).await?;
    let messages = state.store().with_authors(messages, viewer_id).await?;
    let stats = state.store().user_stats(id).await?;

    let is_followed_by_viewer = match viewer_id {
        Some(viewer_id) => Some(state.store().is_following(viewer_id, id).await?),
        None => None,
    };

    let flashes = flash::take(&session).await?;

    Ok(Json(
        ApiResponse::success(ProfileDto {
            user,
            stats,
            messages,
            is_followed_by_viewer,
        })
        .with_flashes(flashes),
    ))
}

/// GET /users/{id}/following
pub async fn show_following(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowListDto>>, ApiError> {
    let id = validate_user_id(id)?;
    let user = require_user(&state, id).await?;
    let users = state.store().following(id).await?;

    follow_list(&state, &me, &user, "following", users).await
}

/// GET /users/{id}/followers
pub async fn show_followers(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowListDto>>, ApiError> {
    let id = validate_user_id(id)?;
    let user = require_user(&state, id).await?;
    let users = state.store().followers(id).await?;

    follow_list(&state, &me, &user, "followers", users).await
}

/// GET /users/{id}/likes
pub async fn show_likes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikesDto>>, ApiError> {
    let id = validate_user_id(id)?;
    let user = require_user(&state, id).await?;

    let messages = state.store().liked_messages(id).await?;
    let messages = state.store().with_authors(messages, Some(me.id)).await?;

    Ok(Json(ApiResponse::success(LikesDto {
        user: UserSummary::from(&user),
        messages,
    })))
}

/// POST /users/follow/{id}
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let id = validate_user_id(id)?;
    state.user_service().follow(me.id, id).await?;

    Ok(redirect(&format!("/users/{}/following", me.id)))
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let id = validate_user_id(id)?;
    state.user_service().unfollow(me.id, id).await?;

    Ok(redirect(&format!("/users/{}/following", me.id)))
}

/// GET /users/profile
pub async fn show_profile(
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(me))
}

/// POST /users/profile
/// Re-checks the current password before saving.
pub async fn edit_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<EditUserForm>,
) -> Result<Response, ApiError> {
    let form = forms::validated(form)?;

    let update = ProfileUpdate {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        image_url: form.image_url,
        header_image_url: form.header_image_url,
        bio: form.bio,
        location: form.location,
    };

    match state
        .user_service()
        .update_profile(me.id, &form.password, update)
        .await
    {
        Ok(user) => {
            flash::push(&session, FlashCategory::Success, "Profile updated.").await?;
            Ok(redirect(&format!("/users/{}", user.id)))
        }
        Err(UserError::InvalidCredentials) => {
            flash::push(
                &session,
                FlashCategory::Danger,
                "Wrong password, please try again.",
            )
            .await?;
            Ok(redirect("/"))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /users/delete
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    session: Session,
) -> Result<Response, ApiError> {
    state.user_service().delete_user(me.id).await?;

    auth::do_logout(&session).await?;
    flash::push(&session, FlashCategory::Info, "Your account has been deleted.").await?;

    Ok(redirect("/"))
}

// ============================================================================
// Helpers
// ============================================================================

async fn require_user(state: &AppState, id: i32) -> Result<User, ApiError> {
    state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))
}

async fn follow_list(
    state: &AppState,
    me: &User,
    user: &User,
    relation: &'static str,
    users: Vec<User>,
) -> Result<Json<ApiResponse<FollowListDto>>, ApiError> {
    let my_following: HashSet<i32> = state
        .store()
        .following(me.id)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    let users = users
        .into_iter()
        .map(|u| FollowEntryDto {
            following: my_following.contains(&u.id),
            user: UserSummary::from(&u),
            bio: u.bio,
        })
        .collect();

    Ok(Json(ApiResponse::success(FollowListDto {
        user: UserSummary::from(user),
        relation,
        users,
    })))
}
