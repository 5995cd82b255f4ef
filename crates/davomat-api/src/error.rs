//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use davomat_core::ErpError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error type for consistent error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid session, or upstream refused the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The ERP could not be reached or answered with an error.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

impl From<ErpError> for ApiError {
    fn from(err: ErpError) -> Self {
        match err {
            ErpError::NotAuthenticated
            | ErpError::CredentialsUnavailable
            | ErpError::ReauthenticationFailed(_)
            | ErpError::UpstreamAuthFailed(_) => ApiError::Unauthorized(err.to_string()),
            ErpError::UpstreamUnavailable(_) => ApiError::BadGateway(err.to_string()),
            ErpError::Config(_) | ErpError::Cipher(_) | ErpError::Store(_) => {
                error!(error = %err, "Request failed locally");
                ApiError::Internal("local failure".to_string())
            }
        }
    }
}
