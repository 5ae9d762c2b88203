pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{auth_service::AuthService, session_service::SessionService};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub session_service: SessionService,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            auth_service: AuthService::from_config(config),
            session_service: SessionService::new(config.session_ttl_secs),
        }
    }
}

/// Full HTTP surface: health, login, and the session-guarded routes.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let session_api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_session,
        ));

    let auth_api = Router::new()
        .route("/api/auth/telegram", post(routes::auth::telegram_login))
        .merge(session_api)
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::RateLimiter::new(config.auth_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(auth_api)
        .with_state(state)
        .layer(middleware::cors::cors_layer(
            config.cors_allowed_origin.as_deref(),
        ))
        .layer(TraceLayer::new_for_http())
}
