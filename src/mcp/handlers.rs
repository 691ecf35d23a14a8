//! MCP Tool Handlers
//!
//! Parses tool arguments into the operation schemas and calls the bridge.

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::bike::schema::{
    parse_args, CreateDocumentInput, CreateRowsInput, DeleteRowsInput, GetOutlineInput,
    GroupRowsInput, ListDocumentsInput, QueryRowsInput, UpdateRowsInput,
};
use crate::bike::BikeBridge;
use crate::error::BridgeError;

use super::protocol::ToolCallResult;

/// Tool handlers backed by one bridge
pub struct ToolHandlers {
    bridge: BikeBridge,
}

impl ToolHandlers {
    pub fn new(bridge: BikeBridge) -> Self {
        Self { bridge }
    }

    /// Handle a tool call by name
    pub async fn handle(&self, name: &str, args: Value) -> ToolCallResult {
        match self.dispatch(name, args).await {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                let code = e
                    .downcast_ref::<BridgeError>()
                    .map_or("transport", BridgeError::code);
                tracing::warn!(tool = name, code, "tool call failed");
                ToolCallResult::error(e)
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<String> {
        let text = match name {
            "bike_list_documents" => {
                parse_args::<ListDocumentsInput>(args)?;
                self.bridge.list_documents().await?
            }
            "bike_get_outline" => self.bridge.get_outline(parse_args(args)?).await?,
            "bike_create_document" => {
                let input: CreateDocumentInput = parse_args(args)?;
                self.bridge.create_document(input).await?
            }
            "bike_create_rows" => {
                let input: CreateRowsInput = parse_args(args)?;
                self.bridge.create_rows(input).await?
            }
            "bike_group_rows" => {
                let input: GroupRowsInput = parse_args(args)?;
                self.bridge.group_rows(input).await?
            }
            "bike_update_rows" => {
                let input: UpdateRowsInput = parse_args(args)?;
                self.bridge.update_rows(input).await?
            }
            "bike_delete_rows" => {
                let input: DeleteRowsInput = parse_args(args)?;
                self.bridge.delete_rows(input).await?
            }
            "bike_query_rows" => {
                let input: QueryRowsInput = parse_args(args)?;
                self.bridge.query_rows(input).await?
            }
            _ => return Err(anyhow!("Unknown tool: {}", name)),
        };
        Ok(text)
    }
}
