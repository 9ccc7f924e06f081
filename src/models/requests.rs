use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// POST /auth
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

// POST /verify
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

// GET /token
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub access_token: String,
}

// POST /vehicles
#[derive(Debug, Deserialize)]
pub struct VehiclesRequest {
    pub email: String,
    pub uuid: String,
}

// POST /{command}. Anything beyond the required fields is passed through
// to the command body, overriding the table defaults.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub email: String,
    pub vin: String,
    pub uuid: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
