//! MCP Tool Definitions
//!
//! Defines all available tools for the Bike MCP server. Bounds and enums
//! mirror the input schemas in `bike::schema`.

use serde_json::{json, Value};

use super::protocol::{Tool, ToolAnnotations};
use crate::bike::model::RowType;
use crate::bike::schema::{
    MAX_DEPTH, MAX_GROUP_NAME_LEN, MAX_ID_LEN, MAX_PATH_LEN, MAX_TEXT_LEN, MIN_DEPTH,
};

fn row_id(description: &str) -> Value {
    json!({
        "type": "string",
        "maxLength": MAX_ID_LEN,
        "pattern": "^[A-Za-z0-9_-]+$",
        "description": description
    })
}

fn row_ids(description: &str) -> Value {
    json!({
        "type": "array",
        "items": row_id("Row ID"),
        "minItems": 1,
        "description": description
    })
}

fn row_type() -> Value {
    json!({
        "type": "string",
        "enum": RowType::INPUT_NAMES,
        "description": "Row type; 'blockquote' is accepted as 'quote'"
    })
}

fn position(description: &str) -> Value {
    json!({
        "type": "string",
        "enum": ["first", "last", "before", "after"],
        "description": description
    })
}

/// Recursive outline tree, shared by both create tools.
fn structure(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "$ref": "#/$defs/outlineNode" },
        "description": description
    })
}

fn outline_defs() -> Value {
    json!({
        "outlineNode": {
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "maxLength": MAX_TEXT_LEN,
                    "description": "Text content for the row"
                },
                "type": row_type(),
                "children": {
                    "type": "array",
                    "items": { "$ref": "#/$defs/outlineNode" }
                }
            },
            "required": ["name"],
            "additionalProperties": false
        }
    })
}

/// Get all available MCP tools
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "bike_list_documents".into(),
            title: "List Bike Documents".into(),
            description: "Lists all open documents in Bike with their names and IDs, one per \
                          line. The front document is marked with '*'. Returns \
                          'No documents open' when there are none."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::READ_ONLY,
        },
        Tool {
            name: "bike_get_outline".into(),
            title: "Get Bike Document Outline".into(),
            description: "Returns the outline of the front document as indented lines of the \
                          form '- text [row:ID]'. Use the row IDs with the other tools."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "max_depth": {
                        "type": "integer",
                        "minimum": MIN_DEPTH,
                        "maximum": MAX_DEPTH,
                        "description": "Number of levels to show, counting top-level rows as level 1: 1 shows only top-level rows, 2 adds their children (default: all)"
                    }
                },
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::READ_ONLY,
        },
        Tool {
            name: "bike_create_document".into(),
            title: "Create Bike Document".into(),
            description: "Creates a new Bike document, optionally filled with an outline \
                          structure. Returns 'Name (doc:ID)'."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "structure": structure("Optional rows for the new document")
                },
                "additionalProperties": false,
                "$defs": outline_defs()
            }),
            annotations: ToolAnnotations::ADDITIVE,
        },
        Tool {
            name: "bike_create_rows".into(),
            title: "Create Outline Structure".into(),
            description: "Creates rows from a nested structure in the front document. Use \
                          parent_id with first/last to add children, or reference_id with \
                          before/after to add siblings."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "structure": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/outlineNode" },
                        "minItems": 1,
                        "description": "Outline nodes to create"
                    },
                    "parent_id": row_id("Parent row (default: document root)"),
                    "position": position("Where to insert (default: last)"),
                    "reference_id": row_id("Sibling row, required for before/after")
                },
                "required": ["structure"],
                "additionalProperties": false,
                "$defs": outline_defs()
            }),
            annotations: ToolAnnotations::ADDITIVE,
        },
        Tool {
            name: "bike_group_rows".into(),
            title: "Group Rows".into(),
            description: "Groups rows under a new or existing parent. Provide group_name to \
                          create a new parent row (placed where the first listed row is, unless \
                          position is given), or parent_id to move the rows into an existing \
                          row. parent_id wins when both are given."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "row_ids": row_ids("Rows to move, in order"),
                    "group_name": {
                        "type": "string",
                        "maxLength": MAX_GROUP_NAME_LEN,
                        "description": "Text of a new group row"
                    },
                    "parent_id": row_id("Existing row to move the rows into"),
                    "position": position("Where to place a new group row"),
                    "reference_id": row_id("Sibling row, required for before/after")
                },
                "required": ["row_ids"],
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::ADDITIVE,
        },
        Tool {
            name: "bike_update_rows".into(),
            title: "Update Rows".into(),
            description: "Changes the text and/or type of rows. With html=true the name is \
                          Bike markup; the row is re-imported and gets a new ID, which is \
                          reported."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "updates": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "row_id": row_id("Row to update"),
                                "name": {
                                    "type": "string",
                                    "maxLength": MAX_TEXT_LEN,
                                    "description": "New text"
                                },
                                "type": row_type(),
                                "html": {
                                    "type": "boolean",
                                    "default": false,
                                    "description": "Treat name as markup"
                                }
                            },
                            "required": ["row_id"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["updates"],
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::DESTRUCTIVE,
        },
        Tool {
            name: "bike_delete_rows".into(),
            title: "Delete Rows".into(),
            description: "Deletes rows and their children. Missing rows are skipped; the \
                          count of deleted rows is returned."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "row_ids": row_ids("Rows to delete")
                },
                "required": ["row_ids"],
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::DESTRUCTIVE,
        },
        Tool {
            name: "bike_query_rows".into(),
            title: "Query Rows".into(),
            description: "Runs a Bike outline path query (e.g. '//task', '//heading/*') and \
                          lists matching rows. Returns 'No rows found' when nothing matches."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "outline_path": {
                        "type": "string",
                        "minLength": 1,
                        "maxLength": MAX_PATH_LEN,
                        "description": "Outline path expression"
                    }
                },
                "required": ["outline_path"],
                "additionalProperties": false
            }),
            annotations: ToolAnnotations::READ_ONLY,
        },
    ]
}
