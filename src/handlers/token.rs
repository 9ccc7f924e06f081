use axum::extract::State;

use super::require_field;
use crate::error::ServerError;
use crate::extract::{Json, Query};
use crate::models::{TokenQuery, TokenResponse};
use crate::AppState;

/// Return the stored first-stage access token for an identity, refreshing
/// it first if it has expired.
pub async fn get_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, ServerError> {
    require_field(&query.email, "email")?;

    tracing::debug!(identity = %query.email, "Fetching stored token");
    let tokens = state
        .token_store
        .load(&query.email)
        .await?
        .ok_or_else(|| ServerError::NotFound("Token not found.".to_string()))?;

    Ok(Json(TokenResponse {
        success: true,
        access_token: tokens.access_token,
    }))
}
