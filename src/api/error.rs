use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::ConfigError;
use crate::validation::ValidationError;
use crate::webhook::{SignatureError, WebhookError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Carries the message shown to the caller; the gateway error itself is
    /// logged where it happens.
    #[error("{0}")]
    Provisioning(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_)
            | ApiError::Config(_)
            | ApiError::Provisioning(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error against the operation that produced it.
    pub fn logged(self, operation: &str) -> Self {
        if self.status().is_server_error() {
            error!(operation, "{}", self);
        } else {
            warn!(operation, "{}", self);
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(_) => "Database error occurred".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::Config(_) => "Service is not configured for this operation".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingParameter(param) => ApiError::BadRequest(format!("{} is required", param)),
            ValidationError::InvalidEvmAddress(addr) | ValidationError::InvalidSolanaAddress(addr) => {
                ApiError::InvalidAddress(addr)
            }
            ValidationError::InvalidNetwork(network) => ApiError::BadRequest(format!("unsupported network {}", network)),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Signature(SignatureError::Mismatch) => {
                ApiError::Unauthorized("Invalid webhook signature".to_string())
            }
            WebhookError::Signature(e) => ApiError::BadRequest(e.to_string()),
            WebhookError::MalformedPayload(e) => ApiError::BadRequest(format!("Malformed webhook payload: {}", e)),
            WebhookError::Database(e) => ApiError::Database(e),
            WebhookError::Timeout => ApiError::Internal("webhook processing timed out".to_string()),
        }
    }
}
