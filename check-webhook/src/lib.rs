//! Check Webhook - HMAC-authenticated webhook receiver.
//!
//! Deliveries arrive as `POST /webhook` with a JSON body and a
//! `Check-Signature` header holding the hex HMAC-SHA256 of the body keyed by
//! the shared webhook token.
//!
//! ## Flow
//!
//! ```text
//! Request → CanonicalBody → Check-Signature → verify() → 204 / 400 / 403
//! ```

pub mod config;
pub mod web;

// Re-export commonly used types
pub use config::{BodyMode, Config, ConfigError};
pub use web::{router, verify, AppState, AuthFailure, WebhookError};
