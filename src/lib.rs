pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Configuration;
pub use error::ServerError;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use services::{CookieJarStore, LoginFlow, LoginLocks, SessionStore, TokenStore};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub configuration: Arc<Configuration>,
    pub session_store: Arc<SessionStore>,
    pub token_store: Arc<TokenStore>,
    pub cookie_store: Arc<CookieJarStore>,
    pub login_flow: Arc<LoginFlow>,
    pub login_locks: Arc<LoginLocks>,
}

/// Build the full application router. Named vehicle commands share one
/// catch-all route; the handler rejects names missing from the command table.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth", post(handlers::begin_auth))
        .route("/verify", post(handlers::verify_mfa))
        .route("/token", get(handlers::get_token))
        .route("/vehicles", post(handlers::list_vehicles))
        .route("/{command}", post(handlers::run_command))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_bearer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
