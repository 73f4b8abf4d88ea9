use axum::{
    Form,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::flash::{self, FlashCategory};
use super::{ApiError, AppState, redirect};
use crate::forms::{self, LoginForm, UserAddForm};
use crate::models::user::{NewUser, User};

/// Session key holding the logged-in user's id.
pub const CURR_USER_KEY: &str = "curr_user";

pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

/// The authenticated user, inserted into request extensions by [`require_login`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Gate for routes that need a logged-in user. Anyone else is sent back to
/// the home page with an "Access unauthorized." flash.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = current_user(&state, &session).await? {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }

    deny_access(&session).await
}

/// Flash the standard warning and redirect home.
pub async fn deny_access(session: &Session) -> Result<Response, ApiError> {
    flash::push(session, FlashCategory::Danger, ACCESS_UNAUTHORIZED).await?;
    Ok(redirect("/"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /signup
/// Create a user, log them in and redirect home.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<UserAddForm>,
) -> Result<Response, ApiError> {
    let form = forms::validated(form)?;

    let user = state
        .user_service()
        .signup(NewUser {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password,
            image_url: form.image_url,
        })
        .await?;

    do_login(&session, &user).await?;
    flash::push(
        &session,
        FlashCategory::Success,
        format!("Welcome to Warbler, {}!", user.username),
    )
    .await?;

    Ok(redirect("/"))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let form = forms::validated(form)?;

    let Some(user) = state
        .user_service()
        .authenticate(form.username.trim(), &form.password)
        .await?
    else {
        tracing::info!(username = %form.username, "Failed login attempt");
        return Err(ApiError::Unauthorized("Invalid credentials.".to_string()));
    };

    do_login(&session, &user).await?;
    flash::push(
        &session,
        FlashCategory::Success,
        format!("Hello, {}!", user.username),
    )
    .await?;

    Ok(redirect("/"))
}

/// POST /logout
pub async fn logout(session: Session) -> Result<Response, ApiError> {
    do_logout(&session).await?;
    flash::push(
        &session,
        FlashCategory::Success,
        "You have successfully logged out.",
    )
    .await?;

    Ok(redirect("/"))
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the session's user, dropping the key if that user no longer exists.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(user_id) = session
        .get::<i32>(CURR_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
    else {
        return Ok(None);
    };

    let user = state.store().get_user(user_id).await?;
    if user.is_none() {
        do_logout(session).await?;
    }
    Ok(user)
}

pub async fn do_login(session: &Session, user: &User) -> Result<(), ApiError> {
    // New id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to cycle session: {e}")))?;

    session
        .insert(CURR_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(())
}

pub async fn do_logout(session: &Session) -> Result<(), ApiError> {
    session
        .remove::<i32>(CURR_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    Ok(())
}
