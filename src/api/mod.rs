use axum::{
    Router,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{MessageService, UserService};
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod flash;
mod home;
mod messages;
mod observability;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn message_service(&self) -> &Arc<dyn MessageService> {
        &self.shared.message_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Plain 302, which is what browsers and form posts expect after an action.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    let (secure_cookies, expiry_minutes) = {
        let server = &state.config().server;
        (server.secure_cookies, server.session_expiry_minutes)
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            expiry_minutes,
        )));

    Router::new()
        .merge(protected_routes)
        .route("/", get(home::homepage))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::show_user))
        .route("/messages/{id}", get(messages::show_message))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{id}/following", get(users::show_following))
        .route("/users/{id}/followers", get(users::show_followers))
        .route("/users/{id}/likes", get(users::show_likes))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route(
            "/users/profile",
            get(users::show_profile).post(users::edit_profile),
        )
        .route("/users/delete", post(users::delete_user))
        .route("/messages/new", post(messages::new_message))
        .route("/messages/{id}/delete", post(messages::delete_message))
        .route("/messages/{id}/like", post(messages::like_message))
        .route("/messages/{id}/unlike", post(messages::unlike_message))
        .route_layer(middleware::from_fn_with_state(state, auth::require_login))
}
