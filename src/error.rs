use axum::http::StatusCode;
use thiserror::Error;

/// Failure taxonomy shared by all three gateways. Each gateway validates its
/// configuration at construction and reports backend failures as values, so
/// callers never have to distinguish errors by message content.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate into the handler rejection shape used across the API layer.
    pub fn into_response_parts(self) -> (StatusCode, String) {
        (self.status(), self.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Backend(err.to_string())
    }
}
