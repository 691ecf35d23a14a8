//! Command Builder
//!
//! One builder per operation. Each combines a fixed AppleScript template
//! with sanitized slot values; see [`super::script`] for the slot rules.
//! Reads serialize rows as `- name [row:ID]` lines so the façade can return
//! host output as-is.

use std::fmt::Write;

use super::encode::{self, Encoding, TextMode};
use super::model::{InsertionPoint, OutlineNode, RowType};
use super::sanitize::{escape_text, EscapedText, RowId};
use super::script::{Fragment, Script, ScriptTemplate};
use crate::error::Result;

macro_rules! create_rows_handler {
    () => {
        r#"on createRows(nodeList, parentRow)
  tell application ${app}
    tell front document
      repeat with node in nodeList
        set newRow to make row at end of rows of parentRow with properties {name:theName of node, type:theType of node}
        set childNodes to theChildren of node
        if (count of childNodes) > 0 then
          my createRows(childNodes, newRow)
        end if
      end repeat
    end tell
  end tell
end createRows
"#
    };
}

const PROBE_RUNNING: &str = r#"
tell application "System Events"
  return exists (processes where name is ${app})
end tell
"#;

const PROBE_DOCUMENT: &str = r#"
tell application ${app}
  return (count of documents) > 0
end tell
"#;

const LIST_DOCUMENTS: &str = r#"
tell application ${app}
  set docCount to count of documents
  if docCount is 0 then
    return "No documents open"
  end if
  set frontDocId to id of root row of front document
  set outputText to ""
  repeat with i from 1 to docCount
    set doc to document i
    set docName to name of doc
    set docId to id of root row of doc
    if docId is frontDocId then
      set outputText to outputText & "* " & docName & " (doc:" & docId & ")"
    else
      set outputText to outputText & "  " & docName & " (doc:" & docId & ")"
    end if
    if i < docCount then
      set outputText to outputText & linefeed
    end if
  end repeat
  return outputText
end tell
"#;

const GET_OUTLINE: &str = r#"
on rowToOutline(r, indentLevel, maxD)
  tell application ${app}
    set rowId to id of r
    set rowName to name of r
    set indent to ""
    repeat indentLevel times
      set indent to indent & "  "
    end repeat
    set lineText to indent & "- " & rowName & " [row:" & rowId & "]" & linefeed
    if maxD is not -1 and (indentLevel + 1) >= maxD then
      return lineText
    end if
    repeat with childRow in (rows of r)
      set lineText to lineText & my rowToOutline(childRow, indentLevel + 1, maxD)
    end repeat
    return lineText
  end tell
end rowToOutline

tell application ${app}
  set doc to front document
  set docName to name of doc
  set docId to id of root row of doc
  set outputText to docName & " (doc:" & docId & ")" & linefeed & linefeed
  repeat with r in (rows of root row of doc)
    set outputText to outputText & my rowToOutline(r, 0, ${max_depth})
  end repeat
  return outputText
end tell
"#;

const CREATE_DOCUMENT_EMPTY: &str = r#"
tell application ${app}
  set newDoc to make document
  set docId to id of root row of newDoc
  set docName to name of newDoc
  return docName & " (doc:" & docId & ")"
end tell
"#;

const CREATE_DOCUMENT_MARKUP: &str = r#"
tell application ${app}
  set newDoc to make document
  set docId to id of root row of newDoc
  tell newDoc
    import from ${markup} as bike format to end of rows of root row
  end tell
  set docName to name of newDoc
  return docName & " (doc:" & docId & ")"
end tell
"#;

const CREATE_DOCUMENT_RECORDS: &str = concat!(
    create_rows_handler!(),
    r#"
tell application ${app}
  set newDoc to make document
  set docId to id of root row of newDoc
  tell newDoc
    set nodeList to {${records}}
    my createRows(nodeList, root row)
  end tell
  set docName to name of newDoc
  return docName & " (doc:" & docId & ")"
end tell
"#
);

const CREATE_ROWS_MARKUP: &str = r#"
tell application ${app}
  tell front document
    ${prelude}
    import from ${markup} as bike format to ${location}
    return "Created " & ${count} & " row(s)"
  end tell
end tell
"#;

const CREATE_ROWS_RECORDS: &str = concat!(
    create_rows_handler!(),
    r#"
tell application ${app}
  tell front document
    ${prelude}
    set nodeList to {${records}}
    set lastCreated to missing value
    repeat with node in nodeList
      if lastCreated is missing value then
        set newRow to make row at ${location} with properties {name:theName of node, type:theType of node}
      else
        set newRow to make row at after lastCreated with properties {name:theName of node, type:theType of node}
      end if
      set lastCreated to newRow
      set childNodes to theChildren of node
      if (count of childNodes) > 0 then
        my createRows(childNodes, newRow)
      end if
    end repeat
    return "Created " & ${count} & " row(s)"
  end tell
end tell
"#
);

const GROUP_INTO_EXISTING: &str = r#"
tell application ${app}
  tell front document
    set targetParent to row id ${parent}
    set rowsToMove to ${row_ids}
    repeat with rowId in rowsToMove
      move row id (contents of rowId) to end of rows of targetParent
    end repeat
    return "Moved " & (count of rowsToMove) & " row(s) to existing parent [row:" & (id of targetParent) & "]"
  end tell
end tell
"#;

const GROUP_INTO_NEW: &str = r#"
tell application ${app}
  tell front document
    ${prelude}
    set newGroup to make row at ${location} with properties {name:${group_name}}
    set groupId to id of newGroup
    set rowsToMove to ${row_ids}
    repeat with rowId in rowsToMove
      move row id (contents of rowId) to end of rows of newGroup
    end repeat
    return "Created group: " & (name of newGroup) & " [row:" & groupId & "] with " & (count of rowsToMove) & " row(s)"
  end tell
end tell
"#;

const UPDATE_ROWS: &str = r#"
tell application ${app}
  tell front document
${statements}
    return "Updated " & ${count} & " row(s)"
  end tell
end tell
"#;

// Bike's name setter takes plain text only, so a markup update re-imports
// the row: park its children in front of it, delete it, import the new row
// where it stood, then move the children back in order.
const UPDATE_ROW_HTML: &str = r#"
tell application ${app}
  tell front document
    set targetRow to row id ${row_id}
    set parentRow to container row of targetRow
    set nextRow to next sibling row of targetRow
    set savedType to type of targetRow
    set childIds to id of rows of targetRow
    repeat with childId in childIds
      move row id (contents of childId) to before targetRow
    end repeat
    delete targetRow
    if nextRow is missing value then
      set importedRows to import from ${markup} as bike format to end of rows of parentRow
    else
      set importedRows to import from ${markup} as bike format to before nextRow
    end if
    set newRow to item 1 of importedRows
    ${retype}
    repeat with childId in childIds
      move row id (contents of childId) to end of rows of newRow
    end repeat
    return id of newRow
  end tell
end tell
"#;

const DELETE_ROWS: &str = r#"
tell application ${app}
  tell front document
    set rowsToDelete to ${row_ids}
    set deletedCount to 0
    repeat with rowId in rowsToDelete
      if exists row id (contents of rowId) then
        delete row id (contents of rowId)
        set deletedCount to deletedCount + 1
      end if
    end repeat
    return "Deleted " & deletedCount & " row(s)"
  end tell
end tell
"#;

const QUERY_ROWS: &str = r#"
tell application ${app}
  set queryResult to query front document outline path ${outline_path}
  if class of queryResult is list then
    if (count of queryResult) is 0 then
      return "No rows found"
    end if
    set outputText to ""
    repeat with r in queryResult
      set outputText to outputText & "- " & (name of r) & " [row:" & (id of r) & "]" & linefeed
    end repeat
    return outputText
  else
    return queryResult as text
  end if
end tell
"#;

/// Where `group_rows` puts the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupTarget {
    /// Move under an existing row, as its last children.
    Existing(RowId),
    /// Create a new row at `point` and move the rows into it.
    New { name: String, point: InsertionPoint },
}

/// One validated `update_rows` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStep {
    pub row_id: RowId,
    pub name: Option<String>,
    pub row_type: Option<RowType>,
    pub html: bool,
}

/// Payloads for an `update_rows` batch: at most one in-place payload, then
/// one re-import payload per markup row, in input order.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub in_place: Option<(usize, Script)>,
    pub reimports: Vec<(RowId, Script)>,
}

/// Builds payloads for one host application.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    app: EscapedText,
    encoding: Encoding,
}

impl CommandBuilder {
    pub fn new(app_name: &str, encoding: Encoding) -> Self {
        Self {
            app: EscapedText::new(app_name),
            encoding,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn template(&self, operation: &'static str, source: &'static str) -> ScriptTemplate {
        ScriptTemplate::new(operation, source).bind("app", self.app.clone())
    }

    pub fn probe_running(&self) -> Result<Script> {
        self.template("probe running", PROBE_RUNNING).render()
    }

    pub fn probe_document(&self) -> Result<Script> {
        self.template("probe document", PROBE_DOCUMENT).render()
    }

    pub fn list_documents(&self) -> Result<Script> {
        self.template("list documents", LIST_DOCUMENTS).render()
    }

    /// `max_depth` counts levels shown; `None` walks the whole tree.
    pub fn get_outline(&self, max_depth: Option<u32>) -> Result<Script> {
        let depth = max_depth.map_or(-1, i64::from);
        self.template("get document outline", GET_OUTLINE)
            .bind("max_depth", depth)
            .render()
    }

    pub fn create_document(&self, structure: &[OutlineNode]) -> Result<Script> {
        if structure.is_empty() {
            return self
                .template("create document", CREATE_DOCUMENT_EMPTY)
                .render();
        }
        match self.encoding {
            Encoding::Markup => self
                .template("create document", CREATE_DOCUMENT_MARKUP)
                .bind("markup", markup_literal(structure, TextMode::Plain))
                .render(),
            Encoding::Records => self
                .template("create document", CREATE_DOCUMENT_RECORDS)
                .bind("records", encode::records(structure))
                .render(),
        }
    }

    pub fn create_rows(&self, structure: &[OutlineNode], point: &InsertionPoint) -> Result<Script> {
        let (prelude, location) = resolve(point);
        let template = match self.encoding {
            Encoding::Markup => self
                .template("create rows", CREATE_ROWS_MARKUP)
                .bind("markup", markup_literal(structure, TextMode::Plain)),
            Encoding::Records => self
                .template("create rows", CREATE_ROWS_RECORDS)
                .bind("records", encode::records(structure)),
        };
        template
            .bind("prelude", prelude)
            .bind("location", location)
            .bind("count", structure.len())
            .render()
    }

    pub fn group_rows(&self, row_ids: &[RowId], target: &GroupTarget) -> Result<Script> {
        match target {
            GroupTarget::Existing(parent) => self
                .template("group rows", GROUP_INTO_EXISTING)
                .bind("parent", parent)
                .bind("row_ids", row_ids.to_vec())
                .render(),
            GroupTarget::New { name, point } => {
                let (prelude, location) = resolve(point);
                self.template("group rows", GROUP_INTO_NEW)
                    .bind("prelude", prelude)
                    .bind("location", location)
                    .bind("group_name", EscapedText::new(name))
                    .bind("row_ids", row_ids.to_vec())
                    .render()
            }
        }
    }

    /// Split a batch into in-place property sets and markup re-imports.
    pub fn update_rows(&self, steps: &[UpdateStep]) -> Result<UpdatePlan> {
        let (reimport, in_place): (Vec<&UpdateStep>, Vec<&UpdateStep>) =
            steps.iter().partition(|step| step.html);

        let in_place = if in_place.is_empty() {
            None
        } else {
            let script = self
                .template("update rows", UPDATE_ROWS)
                .bind("statements", update_statements(&in_place))
                .bind("count", in_place.len())
                .render()?;
            Some((in_place.len(), script))
        };

        let reimports = reimport
            .into_iter()
            .map(|step| {
                self.update_row_html(step)
                    .map(|script| (step.row_id.clone(), script))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(UpdatePlan {
            in_place,
            reimports,
        })
    }

    fn update_row_html(&self, step: &UpdateStep) -> Result<Script> {
        let node = OutlineNode {
            name: step.name.clone().unwrap_or_default(),
            row_type: step.row_type.unwrap_or_default(),
            children: Vec::new(),
        };
        let retype = match step.row_type {
            Some(_) => Fragment::new("-- type carried by markup"),
            None => Fragment::new("set type of newRow to savedType"),
        };
        self.template("update rows", UPDATE_ROW_HTML)
            .bind("row_id", &step.row_id)
            .bind("markup", markup_literal(std::slice::from_ref(&node), TextMode::Html))
            .bind("retype", retype)
            .render()
    }

    pub fn delete_rows(&self, row_ids: &[RowId]) -> Result<Script> {
        self.template("delete rows", DELETE_ROWS)
            .bind("row_ids", row_ids.to_vec())
            .render()
    }

    pub fn query_rows(&self, outline_path: &str) -> Result<Script> {
        self.template("query rows", QUERY_ROWS)
            .bind("outline_path", EscapedText::new(outline_path))
            .render()
    }
}

fn markup_literal(structure: &[OutlineNode], mode: TextMode) -> EscapedText {
    EscapedText::new(&encode::markup_document(structure, mode))
}

/// Turn an insertion point into a prelude that binds the rows it needs and
/// a location expression. Sibling locations are relative to the reference
/// row, so Bike finds its container when the payload runs.
fn resolve(point: &InsertionPoint) -> (Fragment, Fragment) {
    fn target(parent: &Option<RowId>) -> Fragment {
        match parent {
            Some(id) => Fragment::new(format!("set targetRow to row id \"{id}\"")),
            None => Fragment::new("set targetRow to root row"),
        }
    }
    fn sibling(reference: &RowId) -> Fragment {
        Fragment::new(format!("set refRow to row id \"{reference}\""))
    }
    match point {
        InsertionPoint::FrontOf(parent) => {
            (target(parent), Fragment::new("front of rows of targetRow"))
        }
        InsertionPoint::EndOf(parent) => (target(parent), Fragment::new("end of rows of targetRow")),
        InsertionPoint::Before(reference) => (sibling(reference), Fragment::new("before refRow")),
        InsertionPoint::After(reference) => (sibling(reference), Fragment::new("after refRow")),
    }
}

fn update_statements(steps: &[&UpdateStep]) -> Fragment {
    let mut out = String::new();
    for step in steps {
        let _ = writeln!(out, "    set targetRow to row id \"{}\"", step.row_id);
        if let Some(name) = &step.name {
            let _ = writeln!(out, "    set name of targetRow to \"{}\"", escape_text(name));
        }
        if let Some(row_type) = step.row_type {
            let _ = writeln!(out, "    set type of targetRow to {}", row_type.keyword());
        }
    }
    Fragment::new(out.trim_end_matches('\n').to_string())
}
