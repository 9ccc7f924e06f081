use axum::extract::State;

use super::require_field;
use crate::error::ServerError;
use crate::extract::Json;
use crate::models::{AuthRequest, MessageResponse};
use crate::AppState;

/// Begin a login: run the PKCE dance through credential submission and MFA
/// code request, leaving a checkpoint behind for the verify endpoint.
pub async fn begin_auth(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    require_field(&req.email, "email")?;
    require_field(&req.password, "password")?;

    // At most one login per identity at a time; a concurrent attempt would
    // overwrite the checkpoint mid-flow.
    let lock = state.login_locks.for_identity(&req.email);
    let _guard = lock.lock().await;

    let method = state.login_flow.begin(&req.email, &req.password).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("MFA request sent. Check your {}.", method.as_str()),
    }))
}
