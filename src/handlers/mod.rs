mod auth;
mod command;
mod token;
mod vehicles;
mod verify;

pub use auth::begin_auth;
pub use command::run_command;
pub use token::get_token;
pub use vehicles::list_vehicles;
pub use verify::verify_mfa;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ServerError;
use crate::extract::Json;
use crate::models::{ApiToken, HealthResponse};
use crate::services::{exchange_api_token, Transport};
use crate::AppState;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Bearer-token guard for every route except /health. Disabled entirely
/// when no api_token is configured.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(expected) = state.configuration.server.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            tracing::warn!(path = %request.uri().path(), "Missing or invalid bearer token");
            Err(ServerError::Unauthorized)
        }
    }
}

/// Shared preamble for vehicle-API handlers: load the stored token pair
/// (refreshing if needed) and exchange it for a device-scoped API token.
pub(crate) async fn prepare_request(
    state: &AppState,
    identity: &str,
    device_id: &str,
) -> Result<(Transport, ApiToken), ServerError> {
    let tokens = state
        .token_store
        .load(identity)
        .await?
        .ok_or_else(|| ServerError::NotFound("Token not found. Authenticate first.".to_string()))?;

    let transport = Transport::new(identity, &state.configuration, state.cookie_store.clone())?;
    let api_token = exchange_api_token(&transport, &state.configuration, &tokens, device_id).await?;
    Ok((transport, api_token))
}

pub(crate) fn require_field(value: &str, name: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{name} is required")));
    }
    Ok(())
}

pub(crate) fn require_device_uuid(value: &str) -> Result<(), ServerError> {
    require_field(value, "uuid")?;
    uuid::Uuid::parse_str(value)
        .map_err(|_| ServerError::BadRequest("uuid must be a valid UUID".to_string()))?;
    Ok(())
}
