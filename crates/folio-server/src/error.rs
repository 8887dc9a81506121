//! Error types for the backend service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// A photo binding value was not configured.
    #[error("photo binding is incomplete: {0} is not set")]
    MissingBinding(&'static str),

    /// No signing credentials in the environment.
    #[error("signing credentials are not available")]
    MissingCredentials,

    /// Signing itself failed.
    #[error("failed to presign photo URL: {0}")]
    Signing(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::MissingBinding(_)
            | ServerError::MissingCredentials
            | ServerError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(error = %self, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
