//! Structure Encoder
//!
//! Lowers an outline tree into one of two wire forms:
//!
//! - a record list (`{theName:..., theType:..., theChildren:{...}}`) for the
//!   host-side recursive `createRows` handler, one host call per row;
//! - a Bike HTML document for the host's bulk import, one call per tree.
//!
//! Both are plain recursive functions over the tree. Sibling order and
//! nesting are kept exactly.

use std::fmt::Write;

use super::model::{OutlineNode, RowType};
use super::sanitize::escape_text;
use super::script::Fragment;

/// Structure strategy for create operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Encoding {
    /// Bulk import of a Bike HTML document.
    #[default]
    Markup,
    /// Per-row creation through a recursive handler.
    Records,
}

/// Whether node names are trusted markup or plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Plain,
    Html,
}

// ── Record list ──

fn write_record(out: &mut String, node: &OutlineNode) {
    out.push_str("{theName:\"");
    out.push_str(&escape_text(&node.name));
    out.push_str("\", theType:");
    out.push_str(node.row_type.keyword());
    out.push_str(", theChildren:{");
    for (i, child) in node.children.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_record(out, child);
    }
    out.push_str("}}");
}

/// Encode top-level nodes as the items of an AppleScript list, without the
/// enclosing braces.
pub fn records(structure: &[OutlineNode]) -> Fragment {
    let mut out = String::new();
    for (i, node) in structure.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_record(&mut out, node);
    }
    Fragment::new(out)
}

// ── Markup ──

/// Escape `& < > "` for element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn write_item(out: &mut String, node: &OutlineNode, mode: TextMode) {
    out.push_str("<li");
    if node.row_type != RowType::Body {
        let _ = write!(out, " data-type=\"{}\"", node.row_type.keyword());
    }
    out.push_str("><p>");
    match mode {
        TextMode::Plain => out.push_str(&escape_html(&node.name)),
        TextMode::Html => out.push_str(&node.name),
    }
    out.push_str("</p>");
    if !node.children.is_empty() {
        out.push_str("<ul>\n");
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            write_item(out, child, mode);
        }
        out.push_str("\n</ul>");
    }
    out.push_str("</li>");
}

/// A single `<li>` element for `node` and its subtree.
pub fn markup_item(node: &OutlineNode, mode: TextMode) -> String {
    let mut out = String::new();
    write_item(&mut out, node, mode);
    out
}

/// A complete Bike HTML document holding `structure` as the root list.
pub fn markup_document(structure: &[OutlineNode], mode: TextMode) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<html>\n<body>\n<ul>\n",
    );
    for (i, node) in structure.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_item(&mut out, node, mode);
    }
    out.push_str("\n</ul>\n</body>\n</html>");
    out
}
