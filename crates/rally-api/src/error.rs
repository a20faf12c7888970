use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use rally_types::InterestError;
use rally_types::api::ErrorBody;

/// Handler error. Interest failures keep their stable code so the app can
/// tell "limit reached" apart from "already connected".
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Interest(#[from] InterestError),

    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Interest(err) => {
                let status = match err {
                    InterestError::InvalidSelfInterest => StatusCode::BAD_REQUEST,
                    InterestError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                    InterestError::DuplicateActiveInterest => StatusCode::CONFLICT,
                    InterestError::NotFound(_) => StatusCode::NOT_FOUND,
                    InterestError::Forbidden => StatusCode::FORBIDDEN,
                    InterestError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    InterestError::StoreUnavailable(msg) => {
                        error!(error = %msg, "Interest store unavailable");
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                let message = match err {
                    InterestError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
                    other => other.to_string(),
                };
                (status, err.code(), message)
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
