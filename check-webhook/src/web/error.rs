//! Webhook request errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::web::signature::AuthFailure;

/// Reasons a delivery is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Expected request to have a body")]
    MissingBody,

    #[error("Required Check-Signature header was not present")]
    MissingSignature,

    #[error("Expected request body to be valid JSON: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Unauthenticated(#[from] AuthFailure),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingBody
            | WebhookError::MissingSignature
            | WebhookError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            WebhookError::Unauthenticated(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Short event name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::MissingBody => "missing_body",
            WebhookError::MissingSignature => "missing_signature",
            WebhookError::MalformedBody(_) => "malformed_body",
            WebhookError::Unauthenticated(_) => "signature_mismatch",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        // String bodies are served as text/plain; charset=utf-8
        (self.status(), self.to_string()).into_response()
    }
}
