use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// A required field is absent or malformed; rejected before any network call.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username and/or password.")]
    InvalidCredentials,

    /// An expected token or marker was missing from a provider response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported authentication method.")]
    UnsupportedMethod,

    /// The remote service answered, but rejected the request.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A request failed at the transport level.
    #[error("Transient network error: {0}")]
    Transient(String),

    /// The poll budget ran out while the command was still in progress.
    /// Retriable out-of-band by re-invoking the command.
    #[error("Timeout: command remained in progress after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) | ServerError::UnsupportedMethod => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized | ServerError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Protocol(_) | ServerError::Upstream(_) | ServerError::Transient(_) => {
                StatusCode::BAD_GATEWAY
            }
            ServerError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ServerError::Storage(_) | ServerError::Configuration(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for ServerError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ServerError::BadRequest(err.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for ServerError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        ServerError::BadRequest(err.body_text())
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        ServerError::Configuration(err.to_string())
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::Transient(err.to_string())
    }
}
