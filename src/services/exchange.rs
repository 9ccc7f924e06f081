use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::Configuration;
use crate::error::ServerError;
use crate::models::{ApiToken, TokenPair};
use crate::services::Transport;

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: String,
    expires_in: u64,
}

/// Trade a first-stage access token for a short-lived vehicle-API token
/// scoped to the given device.
///
/// No retry at this layer; callers decide whether to re-run the chain.
pub async fn exchange_api_token(
    transport: &Transport,
    configuration: &Configuration,
    tokens: &TokenPair,
    device_id: &str,
) -> Result<ApiToken, ServerError> {
    let form = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:token-exchange"),
        ("subject_token", tokens.access_token.as_str()),
        (
            "subject_token_type",
            "urn:ietf:params:oauth:token-type:access_token",
        ),
        ("scope", configuration.vehicle_api.token_scope.as_str()),
        ("device_id", device_id),
    ];

    let (status, body) = transport
        .post_token_form(&configuration.vehicle_api.token_url(), &form)
        .await?;
    if !status.is_success() {
        return Err(ServerError::Upstream(format!(
            "Token exchange failed with {status}"
        )));
    }

    let parsed: ExchangeResponse = serde_json::from_value(body)
        .map_err(|e| ServerError::Protocol(format!("Malformed token exchange response: {e}")))?;
    let expires_at = Utc::now() + Duration::seconds(parsed.expires_in as i64);
    tracing::debug!(%expires_at, "Obtained vehicle API token");

    Ok(ApiToken {
        access_token: parsed.access_token,
        expires_in: parsed.expires_in,
        expires_at,
    })
}
