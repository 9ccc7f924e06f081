use axum::extract::State;

use super::require_field;
use crate::error::ServerError;
use crate::extract::Json;
use crate::models::{MessageResponse, VerifyRequest};
use crate::AppState;

/// Complete a pending login with the user-supplied MFA code.
pub async fn verify_mfa(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    require_field(&req.email, "email")?;
    require_field(&req.code, "code")?;

    let lock = state.login_locks.for_identity(&req.email);
    let _guard = lock.lock().await;

    state.login_flow.complete(&req.email, &req.code).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "MFA completed, tokens saved.".to_string(),
    }))
}
