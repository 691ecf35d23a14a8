//! Input schemas
//!
//! Validated argument shapes for each operation. Deserialization rejects
//! unknown fields and unknown row types (and folds `blockquote` into
//! `quote`); [`Validate`] then enforces the length and range bounds.
//! Combinations of arguments are checked by the operation façade.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{OutlineNode, Position, RowUpdate};
use crate::error::{BridgeError, Result};

pub const MAX_TEXT_LEN: usize = 10_000;
pub const MAX_ID_LEN: usize = 100;
pub const MAX_GROUP_NAME_LEN: usize = 500;
pub const MAX_PATH_LEN: usize = 1_000;
pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 100;

/// Bounds checks that run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Deserialize and validate tool arguments. A missing or null argument
/// object is treated as `{}`.
pub fn parse_args<T: DeserializeOwned + Validate>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    let input: T = serde_json::from_value(args)
        .map_err(|e| BridgeError::invalid_argument(format!("Invalid arguments: {e}")))?;
    input.validate()?;
    Ok(input)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(BridgeError::invalid_argument(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

fn check_id(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(id) => check_len(field, id, MAX_ID_LEN),
        None => Ok(()),
    }
}

fn check_ids(field: &str, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(BridgeError::invalid_argument(format!(
            "{field} must contain at least one ID"
        )));
    }
    ids.iter().try_for_each(|id| check_len(field, id, MAX_ID_LEN))
}

fn check_structure(nodes: &[OutlineNode]) -> Result<()> {
    for node in nodes {
        check_len("name", &node.name, MAX_TEXT_LEN)?;
        check_structure(&node.children)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDocumentsInput {}

impl Validate for ListDocumentsInput {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetOutlineInput {
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl Validate for GetOutlineInput {
    fn validate(&self) -> Result<()> {
        match self.max_depth {
            Some(depth) if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) => {
                Err(BridgeError::invalid_argument(format!(
                    "max_depth must be between {MIN_DEPTH} and {MAX_DEPTH} (got {depth})"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDocumentInput {
    #[serde(default)]
    pub structure: Vec<OutlineNode>,
}

impl Validate for CreateDocumentInput {
    fn validate(&self) -> Result<()> {
        check_structure(&self.structure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRowsInput {
    pub structure: Vec<OutlineNode>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub reference_id: Option<String>,
}

impl Validate for CreateRowsInput {
    fn validate(&self) -> Result<()> {
        if self.structure.is_empty() {
            return Err(BridgeError::invalid_argument(
                "structure must contain at least one node",
            ));
        }
        check_structure(&self.structure)?;
        check_id("parent_id", self.parent_id.as_deref())?;
        check_id("reference_id", self.reference_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRowsInput {
    pub row_ids: Vec<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// `None` keeps a new group where the first listed row is.
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub reference_id: Option<String>,
}

impl Validate for GroupRowsInput {
    fn validate(&self) -> Result<()> {
        check_ids("row_ids", &self.row_ids)?;
        if let Some(name) = &self.group_name {
            check_len("group_name", name, MAX_GROUP_NAME_LEN)?;
        }
        check_id("parent_id", self.parent_id.as_deref())?;
        check_id("reference_id", self.reference_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRowsInput {
    pub updates: Vec<RowUpdate>,
}

impl Validate for UpdateRowsInput {
    fn validate(&self) -> Result<()> {
        if self.updates.is_empty() {
            return Err(BridgeError::invalid_argument(
                "updates must contain at least one entry",
            ));
        }
        for update in &self.updates {
            check_len("row_id", &update.row_id, MAX_ID_LEN)?;
            if let Some(name) = &update.name {
                check_len("name", name, MAX_TEXT_LEN)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRowsInput {
    pub row_ids: Vec<String>,
}

impl Validate for DeleteRowsInput {
    fn validate(&self) -> Result<()> {
        check_ids("row_ids", &self.row_ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRowsInput {
    pub outline_path: String,
}

impl Validate for QueryRowsInput {
    fn validate(&self) -> Result<()> {
        if self.outline_path.trim().is_empty() {
            return Err(BridgeError::invalid_argument("outline_path must not be empty"));
        }
        check_len("outline_path", &self.outline_path, MAX_PATH_LEN)
    }
}
