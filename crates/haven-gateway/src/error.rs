//! Mapping of domain errors onto HTTP responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use haven_core::{Error, ErrorBody};
use tracing::{error, warn};

/// Error returned by route handlers. Every variant renders as
/// `{"error": "..."}`; clients are expected to treat any non-success alike.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] Error),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) | ApiError::Domain(Error::InvalidRequest(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Domain(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
            ApiError::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Rejected request ({}): {}", status, self);
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
