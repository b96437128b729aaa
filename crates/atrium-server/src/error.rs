use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced to API clients. Everything else is logged and contained;
/// nothing is fatal to the serving process.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing session id")]
    MissingSessionId,
    #[error("Unable to read body: {0}")]
    BodyRead(String),
    #[error("Project not found")]
    ProjectNotFound,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingSessionId | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::ProjectNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
