//! Outline data model
//!
//! Transient, request-scoped values. Nothing here carries a host-assigned
//! identity except the IDs the caller passes in.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sanitize::RowId;

/// Row types Bike understands.
///
/// `blockquote` is accepted on input as an alias and lands here as
/// [`RowType::Quote`]; the host has no blockquote type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    #[default]
    Body,
    Heading,
    #[serde(alias = "blockquote")]
    Quote,
    Code,
    Note,
    Unordered,
    Ordered,
    Task,
    Hr,
}

impl RowType {
    pub const ALL: [RowType; 9] = [
        RowType::Body,
        RowType::Heading,
        RowType::Quote,
        RowType::Code,
        RowType::Note,
        RowType::Unordered,
        RowType::Ordered,
        RowType::Task,
        RowType::Hr,
    ];

    /// Names accepted on input, including the alias.
    pub const INPUT_NAMES: [&'static str; 10] = [
        "body",
        "heading",
        "quote",
        "blockquote",
        "code",
        "note",
        "unordered",
        "ordered",
        "task",
        "hr",
    ];

    /// The host's keyword for this type, also used as the markup `data-type`.
    pub fn keyword(self) -> &'static str {
        match self {
            RowType::Body => "body",
            RowType::Heading => "heading",
            RowType::Quote => "quote",
            RowType::Code => "code",
            RowType::Note => "note",
            RowType::Unordered => "unordered",
            RowType::Ordered => "ordered",
            RowType::Task => "task",
            RowType::Hr => "hr",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "blockquote" => Some(RowType::Quote),
            other => Self::ALL.into_iter().find(|t| t.keyword() == other),
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Where new rows go relative to a parent or a reference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    First,
    #[default]
    Last,
    Before,
    After,
}

impl Position {
    pub fn needs_reference(self) -> bool {
        matches!(self, Position::Before | Position::After)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::First => "first",
            Position::Last => "last",
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

/// One node of a caller-supplied outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutlineNode {
    pub name: String,
    #[serde(rename = "type", default)]
    pub row_type: RowType,
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            row_type: RowType::Body,
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, row_type: RowType) -> Self {
        self.row_type = row_type;
        self
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineNode::count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(OutlineNode::depth).max().unwrap_or(0)
    }
}

/// One entry of an `update_rows` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowUpdate {
    pub row_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub row_type: Option<RowType>,
    #[serde(default)]
    pub html: bool,
}

/// A resolved insertion point, evaluated by the host when the payload runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Front of the children of `parent` (the root row when `None`).
    FrontOf(Option<RowId>),
    /// End of the children of `parent` (the root row when `None`).
    EndOf(Option<RowId>),
    Before(RowId),
    After(RowId),
}
