//! Web server module for receiving signed webhook deliveries.
//!
//! The router exposes a single route, `POST /webhook`, which authenticates
//! the `Check-Signature` header against the request body and acknowledges
//! authentic deliveries with 204 No Content.

pub mod body;
pub mod error;
pub mod handlers;
pub mod signature;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tower_http::trace::TraceLayer;

pub use body::CanonicalBody;
pub use error::WebhookError;
pub use handlers::{authenticate, check_webhook, signature_header, AppState};
pub use signature::{compute_signature, verify, AuthFailure, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/webhook", post(check_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
