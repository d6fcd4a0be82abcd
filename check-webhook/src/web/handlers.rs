//! Webhook endpoint handler.
//!
//! A delivery goes through a fixed pipeline:
//! 1. Build the canonical body (the body must be present and valid JSON)
//! 2. Require the `Check-Signature` header
//! 3. Verify the signature against the shared token
//! 4. Acknowledge with 204 No Content

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{error, info, warn};

use crate::web::body::CanonicalBody;
use crate::web::error::WebhookError;
use crate::web::signature::{verify, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// `POST /webhook` endpoint.
pub async fn check_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let signature = signature_header(&headers);

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        body_mode = state.config.body_mode.as_str(),
        "webhook_received"
    );

    match authenticate(&state.config, &body, signature.as_deref()) {
        Ok(canonical) => {
            info!(canonical_length = canonical.len(), "webhook_authenticated");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(WebhookError::Unauthenticated(failure)) => {
            error!(
                check_signature = %failure.claimed,
                our_signature = %failure.computed,
                request_body = %failure.body,
                "webhook_signature_mismatch"
            );
            Err(WebhookError::Unauthenticated(failure))
        }
        Err(e) => {
            warn!(reason = e.kind(), error = %e, "webhook_rejected");
            Err(e)
        }
    }
}

/// Read the `Check-Signature` header.
///
/// Repeated headers are joined with `", "`, so a delivery carrying the header
/// twice never matches a single digest.
pub fn signature_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<_> = headers
        .get_all(SIGNATURE_HEADER)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Run the precondition checks and signature verification for one delivery.
///
/// The body is checked before the header, so a request missing both is
/// reported as [`WebhookError::MissingBody`].
pub fn authenticate(
    config: &Config,
    raw_body: &[u8],
    signature: Option<&str>,
) -> Result<CanonicalBody, WebhookError> {
    let canonical = CanonicalBody::from_bytes(raw_body, config.body_mode)?;
    let signature = signature.ok_or(WebhookError::MissingSignature)?;

    verify(config.secret_bytes(), canonical.as_bytes(), signature)?;

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyMode;
    use crate::web::signature::compute_signature;
    use axum::http::HeaderValue;

    fn sign(body: &[u8]) -> String {
        compute_signature(b"testsecret", body).unwrap()
    }

    #[test]
    fn test_signature_header_single_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(signature_header(&headers), None);

        headers.insert("check-signature", HeaderValue::from_static("ABC123"));
        assert_eq!(signature_header(&headers).as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_signature_header_repeated_values_are_joined() {
        let signature = sign(br#"{"a":1}"#);
        let mut headers = HeaderMap::new();
        headers.append(SIGNATURE_HEADER, HeaderValue::from_str(&signature).unwrap());
        headers.append(SIGNATURE_HEADER, HeaderValue::from_str(&signature).unwrap());

        let joined = signature_header(&headers).unwrap();
        assert_eq!(joined, format!("{}, {}", signature, signature));

        let config = Config::new("testsecret");
        assert!(matches!(
            authenticate(&config, br#"{"a":1}"#, Some(&joined)),
            Err(WebhookError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_authenticate_valid() {
        let config = Config::new("testsecret");
        let signature = sign(br#"{"a":1}"#);

        let canonical = authenticate(&config, br#"{ "a": 1 }"#, Some(&signature)).unwrap();
        assert_eq!(canonical.as_bytes(), br#"{"a":1}"#);
    }

    #[test]
    fn test_authenticate_checks_body_before_signature() {
        let config = Config::new("testsecret");
        assert!(matches!(
            authenticate(&config, b"", None),
            Err(WebhookError::MissingBody)
        ));
        assert!(matches!(
            authenticate(&config, br#"{"a":1}"#, None),
            Err(WebhookError::MissingSignature)
        ));
    }

    #[test]
    fn test_authenticate_raw_mode_hashes_wire_bytes() {
        let mut config = Config::new("testsecret");
        config.body_mode = BodyMode::Raw;
        let raw = br#"{ "a": 1 }"#;

        let compact = sign(br#"{"a":1}"#);
        assert!(matches!(
            authenticate(&config, raw, Some(&compact)),
            Err(WebhookError::Unauthenticated(_))
        ));

        let wire = sign(raw);
        assert!(authenticate(&config, raw, Some(&wire)).is_ok());
    }
}
