//! Check-Signature verification.
//!
//! Senders sign each delivery with HMAC-SHA256 over the canonical body, keyed
//! by the shared webhook token, and send the lowercase hex digest in the
//! `Check-Signature` header.

use std::fmt;

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the sender's signature.
pub const SIGNATURE_HEADER: &str = "Check-Signature";

/// A delivery whose signature did not match the body.
///
/// Carries both signatures and the body for the rejection response and the
/// error log line of the failing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// Signature supplied by the caller, lowercased
    pub claimed: String,
    /// Signature computed over the body
    pub computed: String,
    /// Canonical body that was hashed
    pub body: String,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not authenticate {}\n  Check Signature: {}\n  Our Signature: {}\n  Request Body: {}",
            SIGNATURE_HEADER, self.claimed, self.computed, self.body
        )
    }
}

impl std::error::Error for AuthFailure {}

/// Compute the lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a claimed signature against the body.
///
/// The comparison ignores ASCII case and runs in constant time for inputs of
/// equal length.
pub fn verify(secret: &[u8], body: &[u8], claimed_signature_hex: &str) -> Result<(), AuthFailure> {
    let claimed = claimed_signature_hex.to_ascii_lowercase();

    // A key the MAC refuses can never authenticate anything.
    let computed = match compute_signature(secret, body) {
        Ok(sig) => sig,
        Err(_) => String::new(),
    };

    if !computed.is_empty() && constant_time_compare(&computed, &claimed) {
        Ok(())
    } else {
        Err(AuthFailure {
            claimed,
            computed,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
