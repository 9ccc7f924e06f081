use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ServerError;

/// JSON body extractor whose rejection is a [`ServerError`]. Axum's own
/// rejection answers in plain text, which would break the contract that
/// every response carries a structured `success` body.
#[derive(Debug, axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query-string extractor with the same structured rejection.
#[derive(Debug, axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct Query<T>(pub T);
