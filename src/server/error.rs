//! HTTP error responses
//!
//! Every failure renders as `{"error": "<message>"}` with a status derived
//! from the library error.

use crate::Error;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Input that parsed but cannot be rendered, e.g. a molecule without a
    /// drawable SMILES string
    pub fn unprocessable(err: Error) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Validation(_) | Error::Smiles(_) => StatusCode::BAD_REQUEST,
        Error::Storage(_) | Error::Io(_) | Error::Export(_) | Error::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// Rejection of the repeated-key query extractor
impl From<axum_extra::extract::QueryRejection> for ApiError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        Self::bad_request(rejection.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Error::not_found("molecule", 3)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::Conflict("dup".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::Export("io".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_kept() {
        let api: ApiError = Error::not_found("sample", 12).into();
        assert_eq!(api.message, "sample 12 not found");
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
