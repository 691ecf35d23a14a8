//! In-memory stand-in for Bike.
//!
//! `FakeBike` implements `ScriptExecutor` and interprets the payloads the
//! command builder emits (identified by their `-- bike-mcp:` header line)
//! against a row tree, so operations can be exercised end to end without
//! macOS.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use bike_mcp::bike::executor::{ExecOutput, ScriptExecutor};
use bike_mcp::bike::{BikeBridge, Encoding, OutlineNode, Script};
use bike_mcp::error::ExecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub name: String,
    pub row_type: String,
    pub children: Vec<Row>,
}

impl Row {
    fn find(&self, id: &str) -> Option<&Row> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Row> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Parent id and index of `id` among its siblings.
    fn locate(&self, id: &str) -> Option<(String, usize)> {
        if let Some(i) = self.children.iter().position(|c| c.id == id) {
            return Some((self.id.clone(), i));
        }
        self.children.iter().find_map(|c| c.locate(id))
    }

    fn detach(&mut self, id: &str) -> Option<Row> {
        if let Some(i) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(i));
        }
        self.children.iter_mut().find_map(|c| c.detach(id))
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a Row>) {
        for child in &self.children {
            out.push(child);
            child.walk(out);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub root: Row,
}

#[derive(Debug, Default)]
struct State {
    running: bool,
    documents: Vec<Document>,
    next_id: u64,
    operations: Vec<String>,
}

impl State {
    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("r{}", self.next_id)
    }

    fn rows_from(&mut self, nodes: &[ParsedNode]) -> Vec<Row> {
        nodes
            .iter()
            .map(|n| {
                let id = self.fresh_id();
                let children = self.rows_from(&n.children);
                Row {
                    id,
                    name: n.name.clone(),
                    row_type: n.row_type.clone(),
                    children,
                }
            })
            .collect()
    }

    fn front(&mut self) -> Result<&mut Document, ExecError> {
        self.documents
            .first_mut()
            .ok_or_else(|| host_error("Can’t get document 1."))
    }
}

/// A node decoded from either wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNode {
    pub name: String,
    pub row_type: String,
    pub children: Vec<ParsedNode>,
}

impl From<&OutlineNode> for ParsedNode {
    fn from(node: &OutlineNode) -> Self {
        Self {
            name: node.name.clone(),
            row_type: node.row_type.keyword().to_string(),
            children: node.children.iter().map(ParsedNode::from).collect(),
        }
    }
}

fn host_error(message: &str) -> ExecError {
    ExecError::NonZeroExit {
        code: 1,
        stderr: format!("execution error: Bike got an error: {message} (-1728)"),
    }
}

fn missing_row(id: &str) -> ExecError {
    host_error(&format!("Can’t get row id \"{id}\"."))
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn capture(source: &str, pattern: &str) -> Option<String> {
    re(pattern)
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read an AppleScript string literal starting just after its opening
/// quote. Returns the value and the bytes consumed, closing quote included.
pub fn read_literal(s: &str) -> (String, usize) {
    let mut out = String::new();
    let mut chars = s.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return (out, i + 1),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            other => out.push(other),
        }
    }
    panic!("unterminated string literal");
}

/// The string literal following `prefix` (which must end with `"`).
fn literal_after(source: &str, prefix: &str) -> Option<String> {
    let start = source.find(prefix)? + prefix.len();
    Some(read_literal(&source[start..]).0)
}

/// Decode a Bike HTML document into nodes.
pub fn parse_markup(xml: &str) -> Vec<ParsedNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<ParsedNode> = Vec::new();
    let mut roots = Vec::new();
    let mut in_p = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => match e.name().as_ref() {
                b"li" => {
                    let row_type = e
                        .try_get_attribute("data-type")
                        .unwrap()
                        .map(|a| a.unescape_value().unwrap().into_owned())
                        .unwrap_or_else(|| "body".to_string());
                    stack.push(ParsedNode {
                        name: String::new(),
                        row_type,
                        children: Vec::new(),
                    });
                }
                b"p" => in_p = true,
                _ => {}
            },
            Event::Text(t) if in_p => {
                if let Some(node) = stack.last_mut() {
                    node.name.push_str(&t.unescape().unwrap());
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"p" => in_p = false,
                b"li" => {
                    let node = stack.pop().unwrap();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    roots
}

/// Decode the record-list encoding, given the text after the list's
/// opening brace.
pub fn parse_records(s: &str) -> Vec<ParsedNode> {
    fn list(s: &str, pos: &mut usize) -> Vec<ParsedNode> {
        let mut items = Vec::new();
        loop {
            let rest = &s[*pos..];
            if let Some(r) = rest.strip_prefix('}') {
                *pos += rest.len() - r.len();
                return items;
            }
            if let Some(r) = rest.strip_prefix(", ") {
                *pos += rest.len() - r.len();
                continue;
            }
            items.push(item(s, pos));
        }
    }
    fn expect(s: &str, pos: &mut usize, token: &str) {
        assert!(s[*pos..].starts_with(token), "expected {token:?} at {}", &s[*pos..]);
        *pos += token.len();
    }
    fn item(s: &str, pos: &mut usize) -> ParsedNode {
        expect(s, pos, "{theName:\"");
        let (name, used) = read_literal(&s[*pos..]);
        *pos += used;
        expect(s, pos, ", theType:");
        let end = s[*pos..].find(',').unwrap();
        let row_type = s[*pos..*pos + end].to_string();
        *pos += end;
        expect(s, pos, ", theChildren:{");
        let children = list(s, pos);
        expect(s, pos, "}");
        ParsedNode {
            name,
            row_type,
            children,
        }
    }
    let mut pos = 0;
    list(s, &mut pos)
}

/// Structure carried by a create payload, in whichever encoding it uses.
fn payload_structure(source: &str) -> Vec<ParsedNode> {
    if let Some(markup) = literal_after(source, "import from \"") {
        parse_markup(&markup)
    } else if let Some(start) = source.find("set nodeList to {") {
        parse_records(&source[start + "set nodeList to {".len()..])
    } else {
        Vec::new()
    }
}

fn quoted_ids(list: &str) -> Vec<String> {
    re(r#""([A-Za-z0-9_-]+)""#)
        .captures_iter(list)
        .map(|c| c[1].to_string())
        .collect()
}

#[derive(Clone)]
enum Slot {
    Child { parent: String, front: bool },
    Sibling { reference: String, after: bool },
}

#[derive(Clone)]
pub struct FakeBike {
    state: Arc<Mutex<State>>,
}

impl FakeBike {
    /// Bike running with no documents.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                running: true,
                ..State::default()
            })),
        }
    }

    pub fn stopped() -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().running = false;
        fake
    }

    /// Bike running with one open document holding `structure`.
    pub fn with_document(name: &str, structure: &[OutlineNode]) -> Self {
        let fake = Self::new();
        {
            let mut state = fake.state.lock().unwrap();
            let parsed: Vec<ParsedNode> = structure.iter().map(ParsedNode::from).collect();
            let children = state.rows_from(&parsed);
            let root = Row {
                id: "doc1".into(),
                name: String::new(),
                row_type: "body".into(),
                children,
            };
            state.documents.push(Document {
                name: name.into(),
                root,
            });
        }
        fake
    }

    pub fn bridge(&self, encoding: Encoding) -> BikeBridge {
        BikeBridge::new(Arc::new(self.clone()), "Bike", encoding)
    }

    /// Operation names of every payload executed so far.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Operations other than the two probes.
    pub fn commands(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter(|op| !op.starts_with("probe"))
            .collect()
    }

    pub fn front_root(&self) -> Row {
        self.state.lock().unwrap().documents[0].root.clone()
    }

    pub fn row(&self, id: &str) -> Option<Row> {
        self.front_root().find(id).cloned()
    }

    /// Id of the first row in the front document named `name`.
    pub fn id_of(&self, name: &str) -> String {
        let root = self.front_root();
        let mut rows = Vec::new();
        root.walk(&mut rows);
        rows.iter()
            .find(|r| r.name == name)
            .map(|r| r.id.clone())
            .unwrap_or_else(|| panic!("no row named {name}"))
    }

    /// Top-level rows of the front document as nodes.
    pub fn structure(&self) -> Vec<ParsedNode> {
        fn to_node(row: &Row) -> ParsedNode {
            ParsedNode {
                name: row.name.clone(),
                row_type: row.row_type.clone(),
                children: row.children.iter().map(to_node).collect(),
            }
        }
        self.front_root().children.iter().map(to_node).collect()
    }

    fn interpret(&self, source: &str) -> Result<String, ExecError> {
        let operation = capture(source, r"(?m)^-- bike-mcp: (.+)$").expect("payload header");
        let mut state = self.state.lock().unwrap();
        state.operations.push(operation.clone());

        match operation.as_str() {
            "probe running" => Ok(state.running.to_string()),
            "probe document" if !state.running => Err(host_error("Application isn’t running.")),
            "probe document" => Ok((!state.documents.is_empty()).to_string()),
            "list documents" => Ok(list_documents(&state)),
            "get document outline" => {
                let max: i64 = capture(source, r"my rowToOutline\(r, 0, (-?\d+)\)")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(-1);
                let doc = state.front()?;
                let mut out = format!("{} (doc:{})\n\n", doc.name, doc.root.id);
                for row in &doc.root.children {
                    render(row, 0, max, &mut out);
                }
                Ok(out)
            }
            "create document" => {
                let parsed = payload_structure(source);
                let children = state.rows_from(&parsed);
                let number = state.documents.len() + 1;
                let root = Row {
                    id: format!("doc{number}"),
                    name: String::new(),
                    row_type: "body".into(),
                    children,
                };
                let reply = format!("Untitled {number} (doc:{})", root.id);
                // A new document becomes the front one.
                state.documents.insert(
                    0,
                    Document {
                        name: format!("Untitled {number}"),
                        root,
                    },
                );
                Ok(reply)
            }
            "create rows" => {
                let slot = insertion_slot(source);
                let parsed = payload_structure(source);
                let rows = state.rows_from(&parsed);
                let count = capture(source, r#"return "Created " & (\d+)"#).unwrap();
                let doc = state.front()?;
                if source.contains("set lastCreated to missing value") {
                    // Records: one `make row` per top-level node. Only the
                    // first uses the location; the rest chain after it.
                    let chained = source.contains("make row at after lastCreated");
                    let mut previous: Option<String> = None;
                    for row in rows {
                        let id = row.id.clone();
                        let at = match previous.take().filter(|_| chained) {
                            Some(reference) => Slot::Sibling {
                                reference,
                                after: true,
                            },
                            None => slot.clone(),
                        };
                        insert(doc, &at, vec![row])?;
                        previous = Some(id);
                    }
                } else {
                    insert(doc, &slot, rows)?;
                }
                Ok(format!("Created {count} row(s)"))
            }
            "group rows" => group_rows(&mut state, source),
            "update rows" => update_rows(&mut state, source),
            "delete rows" => {
                let ids = quoted_ids(&capture(source, r"set rowsToDelete to (\{[^}]*\})").unwrap());
                let doc = state.front()?;
                let deleted = ids
                    .iter()
                    .filter(|id| doc.root.detach(id).is_some())
                    .count();
                Ok(format!("Deleted {deleted} row(s)"))
            }
            "query rows" => {
                let path = literal_after(source, "outline path \"").unwrap();
                let row_type = path
                    .strip_prefix("//")
                    .filter(|t| t.chars().all(|c| c.is_ascii_alphabetic()))
                    .ok_or_else(|| host_error("Invalid outline path."))?
                    .to_string();
                let doc = state.front()?;
                let mut rows = Vec::new();
                doc.root.walk(&mut rows);
                let matches: Vec<_> = rows.into_iter().filter(|r| r.row_type == row_type).collect();
                if matches.is_empty() {
                    return Ok("No rows found".into());
                }
                Ok(matches
                    .iter()
                    .map(|r| format!("- {} [row:{}]\n", r.name, r.id))
                    .collect())
            }
            other => panic!("unexpected payload {other}"),
        }
    }
}

impl Default for FakeBike {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptExecutor for FakeBike {
    async fn execute(&self, script: &Script) -> Result<ExecOutput, ExecError> {
        self.interpret(script.source()).map(|stdout| ExecOutput {
            stdout: format!("{stdout}\n"),
            stderr: String::new(),
        })
    }
}

fn list_documents(state: &State) -> String {
    if state.documents.is_empty() {
        return "No documents open".into();
    }
    state
        .documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let marker = if i == 0 { "*" } else { " " };
            format!("{marker} {} (doc:{})", doc.name, doc.root.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(row: &Row, level: usize, max: i64, out: &mut String) {
    out.push_str(&"  ".repeat(level));
    out.push_str(&format!("- {} [row:{}]\n", row.name, row.id));
    if max != -1 && (level as i64 + 1) >= max {
        return;
    }
    for child in &row.children {
        render(child, level + 1, max, out);
    }
}

fn insertion_slot(source: &str) -> Slot {
    let location = capture(
        source,
        r"(?:as bike format to|make row at) (front of rows of targetRow|end of rows of targetRow|before refRow|after refRow)",
    )
    .expect("insertion location");
    match location.as_str() {
        "before refRow" | "after refRow" => Slot::Sibling {
            reference: capture(source, r#"set refRow to row id "([A-Za-z0-9_-]+)""#).unwrap(),
            after: location == "after refRow",
        },
        _ => Slot::Child {
            parent: capture(source, r#"set targetRow to row id "([A-Za-z0-9_-]+)""#)
                .unwrap_or_default(),
            front: location.starts_with("front"),
        },
    }
}

fn insert(doc: &mut Document, slot: &Slot, rows: Vec<Row>) -> Result<(), ExecError> {
    let (parent, index) = match slot {
        Slot::Child { parent, front } => {
            let parent = if parent.is_empty() {
                doc.root.id.clone()
            } else {
                parent.clone()
            };
            let len = doc
                .root
                .find(&parent)
                .ok_or_else(|| missing_row(&parent))?
                .children
                .len();
            (parent, if *front { 0 } else { len })
        }
        Slot::Sibling { reference, after } => {
            let (parent, i) = doc.root.locate(reference).ok_or_else(|| missing_row(reference))?;
            (parent, if *after { i + 1 } else { i })
        }
    };
    let target = doc.root.find_mut(&parent).ok_or_else(|| missing_row(&parent))?;
    target.children.splice(index..index, rows);
    Ok(())
}

fn group_rows(state: &mut State, source: &str) -> Result<String, ExecError> {
    let ids = quoted_ids(&capture(source, r"set rowsToMove to (\{[^}]*\})").unwrap());

    if let Some(parent) = capture(source, r#"set targetParent to row id "([A-Za-z0-9_-]+)""#) {
        let doc = state.front()?;
        doc.root.find(&parent).ok_or_else(|| missing_row(&parent))?;
        for id in &ids {
            let row = doc.root.detach(id).ok_or_else(|| missing_row(id))?;
            doc.root.find_mut(&parent).unwrap().children.push(row);
        }
        return Ok(format!(
            "Moved {} row(s) to existing parent [row:{parent}]",
            ids.len()
        ));
    }

    let name = literal_after(source, "with properties {name:\"").unwrap();
    let slot = insertion_slot(source);
    let group_id = state.fresh_id();
    let doc = state.front()?;
    let group = Row {
        id: group_id.clone(),
        name: name.clone(),
        row_type: "body".into(),
        children: Vec::new(),
    };
    insert(doc, &slot, vec![group])?;
    for id in &ids {
        let row = doc.root.detach(id).ok_or_else(|| missing_row(id))?;
        doc.root.find_mut(&group_id).unwrap().children.push(row);
    }
    Ok(format!(
        "Created group: {name} [row:{group_id}] with {} row(s)",
        ids.len()
    ))
}

fn update_rows(state: &mut State, source: &str) -> Result<String, ExecError> {
    if source.contains("import from \"") {
        // Markup re-import: same place, same children, new id.
        let id = capture(source, r#"set targetRow to row id "([A-Za-z0-9_-]+)""#).unwrap();
        let markup = literal_after(source, "import from \"").unwrap();
        let inner = {
            let start = markup.find("<p>").unwrap() + "<p>".len();
            let end = markup.rfind("</p>").unwrap();
            markup[start..end].to_string()
        };
        let data_type = capture(&markup, r#"data-type="([a-z]+)""#);
        let new_id = state.fresh_id();
        let doc = state.front()?;
        let row = doc.root.find_mut(&id).ok_or_else(|| missing_row(&id))?;
        row.id = new_id.clone();
        row.name = inner;
        if let Some(t) = data_type {
            assert!(
                !source.contains("set type of newRow to savedType"),
                "typed markup must not restore the old type"
            );
            row.row_type = t;
        } else {
            // The payload restores the saved type.
            assert!(source.contains("set type of newRow to savedType"));
        }
        return Ok(new_id);
    }

    let doc = state.front()?;
    let count = capture(source, r#"return "Updated " & (\d+)"#).unwrap();
    let mut current: Option<String> = None;
    for line in source.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("set targetRow to row id \"") {
            let id = rest.trim_end_matches('"').to_string();
            doc.root.find(&id).ok_or_else(|| missing_row(&id))?;
            current = Some(id);
        } else if let Some(rest) = line.strip_prefix("set name of targetRow to \"") {
            let (name, _) = read_literal(rest);
            let id = current.as_deref().unwrap();
            doc.root.find_mut(id).unwrap().name = name;
        } else if let Some(keyword) = line.strip_prefix("set type of targetRow to ") {
            let id = current.as_deref().unwrap();
            doc.root.find_mut(id).unwrap().row_type = keyword.to_string();
        }
    }
    Ok(format!("Updated {count} row(s)"))
}
