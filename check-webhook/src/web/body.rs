//! Canonical body representation.
//!
//! The signature covers either the compact re-encoding of the parsed JSON
//! body or the wire bytes, depending on [`BodyMode`]. Senders that hash
//! `JSON.stringify(payload)` need the re-encoding: it drops insignificant
//! whitespace, keeps object keys in document order and prints numbers the
//! way an ECMAScript engine does.

use std::borrow::Cow;
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Serializer, Value};

use crate::config::BodyMode;
use crate::web::error::WebhookError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// The exact bytes a delivery's signature is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBody {
    bytes: Vec<u8>,
}

impl CanonicalBody {
    /// Build the canonical representation of a raw request body.
    ///
    /// A leading UTF-8 byte order mark is ignored when parsing. Empty (or
    /// whitespace-only) bodies are [`WebhookError::MissingBody`]. Bodies that
    /// are not a JSON object or array are [`WebhookError::MalformedBody`] in
    /// either mode.
    pub fn from_bytes(raw: &[u8], mode: BodyMode) -> Result<Self, WebhookError> {
        let text = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);

        if text.iter().all(u8::is_ascii_whitespace) {
            return Err(WebhookError::MissingBody);
        }

        let value: Value = serde_json::from_slice(text)
            .map_err(|e| WebhookError::MalformedBody(e.to_string()))?;

        if !(value.is_object() || value.is_array()) {
            return Err(WebhookError::MalformedBody(
                "top-level value must be an object or array".to_string(),
            ));
        }

        let bytes = match mode {
            BodyMode::Reserialized => stringify(&value)
                .map_err(|e| WebhookError::MalformedBody(e.to_string()))?,
            BodyMode::Raw => raw.to_vec(),
        };

        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Body as text for diagnostics.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Compact JSON with ECMAScript number formatting.
fn stringify(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, EcmaScriptFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Compact formatter that writes every number as an IEEE 754 double using
/// Number-to-String rules: `1.0` is `1`, `-0` is `0`, `1e21` is `1e+21`, and
/// integers past 2^53 lose their low digits.
struct EcmaScriptFormatter;

impl EcmaScriptFormatter {
    fn write_number<W>(writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !value.is_finite() {
            return writer.write_all(b"null");
        }
        // Number-to-String has no negative zero
        let value = if value == 0.0 { 0.0 } else { value };
        let mut buffer = ryu_js::Buffer::new();
        writer.write_all(buffer.format(value).as_bytes())
    }
}

impl Formatter for EcmaScriptFormatter {
    fn write_i64<W>(&mut self, writer: &mut W, value: i64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        Self::write_number(writer, value as f64)
    }

    fn write_u64<W>(&mut self, writer: &mut W, value: u64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        Self::write_number(writer, value as f64)
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        Self::write_number(writer, value)
    }
}
