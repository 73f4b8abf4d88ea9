use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{self, CurrentUser};
use super::types::MessageDto;
use super::validation::validate_message_id;
use super::{ApiError, ApiResponse, AppState, redirect};
use crate::forms::{self, LikeMessageForm, MessageForm};
use crate::models::user::UserSummary;
use crate::services::MessageError;

/// POST /messages/new
pub async fn new_message(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    let form = forms::validated(form)?;
    state.message_service().create_message(me.id, &form.text).await?;

    Ok(redirect(&format!("/users/{}", me.id)))
}

/// GET /messages/{id}
pub async fn show_message(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    let id = validate_message_id(id)?;
    let message = state
        .store()
        .get_message(id)
        .await?
        .ok_or_else(|| ApiError::message_not_found(id))?;

    let author = state
        .store()
        .get_user(message.user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(message.user_id))?;

    let like_count = state.store().like_count(id).await?;
    let liked = match auth::current_user(&state, &session).await? {
        Some(viewer) => state.store().get_like(viewer.id, id).await?.is_some(),
        None => false,
    };

    Ok(Json(ApiResponse::success(MessageDto {
        message,
        author: UserSummary::from(&author),
        like_count,
        liked,
    })))
}

/// POST /messages/{id}/delete
/// Only the author may delete; anyone else gets the unauthorized redirect.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let id = validate_message_id(id)?;

    match state.message_service().delete_message(me.id, id).await {
        Ok(()) => Ok(redirect(&format!("/users/{}", me.id))),
        Err(MessageError::NotOwner { .. }) => auth::deny_access(&session).await,
        Err(e) => Err(e.into()),
    }
}

/// POST /messages/{id}/like
pub async fn like_message(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Form(form): Form<LikeMessageForm>,
) -> Result<Response, ApiError> {
    let id = validate_message_id(id)?;
    state
        .message_service()
        .set_like(me.id, id, form.like_unlike)
        .await?;

    Ok(redirect("/"))
}

/// POST /messages/{id}/unlike
pub async fn unlike_message(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let id = validate_message_id(id)?;
    state.message_service().remove_like(me.id, id).await?;

    Ok(redirect("/"))
}
