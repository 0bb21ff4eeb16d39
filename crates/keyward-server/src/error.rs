use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures reported by the license services.
#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("License key not found")]
    NotFound,

    #[error("license key collision")]
    DuplicateKey,

    #[error("could not generate a unique license key")]
    Exhausted,

    #[error("license store unavailable: {0}")]
    Unavailable(String),
}

impl LicenseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LicenseError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            LicenseError::NotFound => StatusCode::NOT_FOUND,
            LicenseError::DuplicateKey | LicenseError::Exhausted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LicenseError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// JSON `{"error": message}` body with `status`. Every failure response uses this shape.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for LicenseError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            LicenseError::InvalidArgument(msg) => {
                tracing::debug!(reason = %msg, "rejected request");
                msg.clone()
            }
            LicenseError::NotFound => self.to_string(),
            LicenseError::DuplicateKey | LicenseError::Exhausted => {
                tracing::error!(error = %self, "key generation failed");
                "internal server error".to_string()
            }
            LicenseError::Unavailable(cause) => {
                tracing::error!(cause = %cause, "license store unavailable");
                "license store unavailable, try again later".to_string()
            }
        };
        error_response(status, message)
    }
}
