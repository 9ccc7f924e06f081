use axum::extract::State;
use serde_json::json;

use super::{prepare_request, require_device_uuid, require_field};
use crate::error::ServerError;
use crate::extract::Json;
use crate::models::{CommandResponse, VehiclesRequest};
use crate::AppState;

/// List the vehicles available on the account.
pub async fn list_vehicles(
    State(state): State<AppState>,
    Json(req): Json<VehiclesRequest>,
) -> Result<Json<CommandResponse>, ServerError> {
    require_field(&req.email, "email")?;
    require_device_uuid(&req.uuid)?;

    tracing::info!(identity = %req.email, "Listing account vehicles");
    let (transport, api_token) = prepare_request(&state, &req.email, &req.uuid).await?;

    let body = json!({
        "includeCommands": true,
        "includeEntitlements": true,
        "includeModules": true,
        "includeSharedVehicles": true,
    });
    let (status, payload) = transport
        .post_json(
            &state.configuration.vehicle_api.vehicles_url(),
            &body,
            &api_token.access_token,
        )
        .await?;
    if !status.is_success() {
        return Err(ServerError::Upstream(format!(
            "Vehicle listing failed with {status}"
        )));
    }

    Ok(Json(CommandResponse {
        success: true,
        response: Some(payload),
    }))
}
