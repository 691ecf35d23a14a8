//! Payload templates with named slots.
//!
//! A template is fixed AppleScript with `${name}` placeholders. Values can
//! only be bound through [`Slot`], and every `Slot` constructor takes an
//! already sanitized type, so there is no way to splice raw caller text
//! into a payload.

use std::collections::HashMap;
use std::fmt;

use super::model::RowType;
use super::sanitize::{EscapedText, RowId};
use crate::error::{BridgeError, Result};

/// A rendered AppleScript program, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    operation: &'static str,
    source: String,
}

impl Script {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Non-empty lines, the unit `osascript -e` consumes.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.source.lines().filter(|line| !line.trim().is_empty())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A piece of AppleScript produced inside this crate (encoder output,
/// resolved locations, handler definitions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub(crate) fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A value that may fill a template slot.
#[derive(Debug, Clone)]
pub enum Slot {
    /// Quoted string literal.
    Text(EscapedText),
    /// Quoted identifier.
    Id(RowId),
    /// List literal of quoted identifiers.
    IdList(Vec<RowId>),
    Int(i64),
    /// Bare keyword such as a row type.
    Keyword(&'static str),
    Fragment(Fragment),
}

impl Slot {
    fn render(&self, out: &mut String) {
        match self {
            Slot::Text(text) => {
                out.push('"');
                out.push_str(text.as_str());
                out.push('"');
            }
            Slot::Id(id) => {
                out.push('"');
                out.push_str(id.as_str());
                out.push('"');
            }
            Slot::IdList(ids) => {
                out.push('{');
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('"');
                    out.push_str(id.as_str());
                    out.push('"');
                }
                out.push('}');
            }
            Slot::Int(n) => out.push_str(&n.to_string()),
            Slot::Keyword(keyword) => out.push_str(keyword),
            Slot::Fragment(fragment) => out.push_str(fragment.as_str()),
        }
    }
}

impl From<EscapedText> for Slot {
    fn from(value: EscapedText) -> Self {
        Slot::Text(value)
    }
}

impl From<RowId> for Slot {
    fn from(value: RowId) -> Self {
        Slot::Id(value)
    }
}

impl From<&RowId> for Slot {
    fn from(value: &RowId) -> Self {
        Slot::Id(value.clone())
    }
}

impl From<Vec<RowId>> for Slot {
    fn from(value: Vec<RowId>) -> Self {
        Slot::IdList(value)
    }
}

impl From<i64> for Slot {
    fn from(value: i64) -> Self {
        Slot::Int(value)
    }
}

impl From<usize> for Slot {
    fn from(value: usize) -> Self {
        Slot::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<RowType> for Slot {
    fn from(value: RowType) -> Self {
        Slot::Keyword(value.keyword())
    }
}

impl From<Fragment> for Slot {
    fn from(value: Fragment) -> Self {
        Slot::Fragment(value)
    }
}

/// Fixed AppleScript source with `${name}` slots.
#[derive(Debug, Clone)]
pub struct ScriptTemplate {
    operation: &'static str,
    source: &'static str,
    bindings: HashMap<&'static str, Slot>,
}

impl ScriptTemplate {
    pub fn new(operation: &'static str, source: &'static str) -> Self {
        Self {
            operation,
            source,
            bindings: HashMap::new(),
        }
    }

    pub fn bind(mut self, name: &'static str, value: impl Into<Slot>) -> Self {
        self.bindings.insert(name, value.into());
        self
    }

    /// Substitute every slot. The template text is scanned once, so bound
    /// values are never re-examined for placeholders.
    pub fn render(&self) -> Result<Script> {
        let mut out = String::with_capacity(self.source.len() + 64);
        out.push_str("-- bike-mcp: ");
        out.push_str(self.operation);
        out.push('\n');

        let mut rest = self.source;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(BridgeError::Template {
                    slot: after.to_string(),
                });
            };
            let name = &after[..end];
            let slot = self
                .bindings
                .get(name)
                .ok_or_else(|| BridgeError::Template {
                    slot: name.to_string(),
                })?;
            slot.render(&mut out);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(Script {
            operation: self.operation,
            source: out,
        })
    }
}
