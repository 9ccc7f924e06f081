use axum::extract::{Path, State};
use serde_json::{Map, Value};

use super::{prepare_request, require_device_uuid, require_field};
use crate::commands;
use crate::error::ServerError;
use crate::extract::Json;
use crate::models::{CommandRequest, CommandResponse};
use crate::services::dispatch;
use crate::AppState;

/// Run a named vehicle command: resolve it against the command table, merge
/// the caller's parameters over the defaults, and dispatch with polling.
pub async fn run_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ServerError> {
    let descriptor = commands::lookup(&command)
        .ok_or_else(|| ServerError::NotFound(format!("Unknown command: {command}")))?;

    require_field(&req.email, "email")?;
    require_field(&req.vin, "vin")?;
    require_device_uuid(&req.uuid)?;

    tracing::info!(identity = %req.email, command = %command, "Dispatching vehicle command");
    let (transport, api_token) = prepare_request(&state, &req.email, &req.uuid).await?;

    let url = state
        .configuration
        .vehicle_api
        .command_url(&req.vin, descriptor.path);
    let body = merge_body(descriptor.default_body, &req.params);

    let outcome = dispatch(
        &transport,
        &state.configuration.dispatch,
        &url,
        &body,
        &api_token.access_token,
    )
    .await?;

    Ok(Json(CommandResponse {
        success: true,
        response: Some(outcome.payload),
    }))
}

/// Caller-supplied parameters override the table defaults. Null and `false`
/// values are dropped afterwards; the table uses `false` as an "unset"
/// placeholder (e.g. `cabinTemperature`) that must not reach the wire.
fn merge_body(default: Value, params: &Map<String, Value>) -> Value {
    let mut body = match default {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in params {
        body.insert(key.clone(), value.clone());
    }
    body.retain(|_, value| !value.is_null() && *value != Value::Bool(false));
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn caller_params_override_defaults() {
        let merged = merge_body(
            json!({"delay": 0, "cabinTemperature": false}),
            &params(json!({"delay": 30})),
        );
        assert_eq!(merged, json!({"delay": 30}));
    }

    #[test]
    fn false_and_null_values_are_dropped() {
        let merged = merge_body(
            json!({"cabinTemperature": false}),
            &params(json!({"delay": null, "enable": true})),
        );
        assert_eq!(merged, json!({"enable": true}));
    }

    #[test]
    fn non_object_default_becomes_caller_params() {
        let merged = merge_body(Value::Null, &params(json!({"delay": 5})));
        assert_eq!(merged, json!({"delay": 5}));
    }
}
