//! Sanitizer
//!
//! Makes caller text and identifiers safe to splice into an AppleScript
//! payload. Payloads are assembled from strings, so this module is the only
//! thing standing between a caller-supplied ID and arbitrary script.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BridgeError, Result};

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is a valid regex")
});

/// Escape text for an AppleScript string literal.
///
/// Backslash must go first, otherwise the escapes introduced for quotes and
/// line breaks would themselves be escaped again. Not safe to apply twice.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Check an identifier against `^[A-Za-z0-9_-]+$`, returning it unchanged.
pub fn validate_identifier(id: &str) -> Result<&str> {
    if IDENTIFIER_PATTERN.is_match(id) {
        Ok(id)
    } else {
        Err(BridgeError::InvalidIdentifier(id.to_string()))
    }
}

/// Validate every identifier, failing on the first bad one.
pub fn validate_identifiers<S: AsRef<str>>(ids: &[S]) -> Result<Vec<RowId>> {
    ids.iter().map(|id| RowId::parse(id.as_ref())).collect()
}

/// A row or document identifier that passed [`validate_identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn parse(id: &str) -> Result<Self> {
        validate_identifier(id).map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text that has been through [`escape_text`] and may sit between quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedText(String);

impl EscapedText {
    pub fn new(raw: &str) -> Self {
        Self(escape_text(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
