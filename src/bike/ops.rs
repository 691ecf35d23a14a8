//! Operation Façade
//!
//! The public operations. Each call runs the same gate sequence:
//! host running, then (except listing) a document open, then argument
//! combinations and identifiers, then build, execute and map the result.
//! Calls are independent; there is no state between them and no retries.

use std::sync::Arc;

use super::commands::{CommandBuilder, GroupTarget, UpdateStep};
use super::encode::Encoding;
use super::executor::{self, CommandResult, ScriptData, ScriptExecutor};
use super::model::{InsertionPoint, Position};
use super::sanitize::{validate_identifiers, RowId};
use super::schema::{
    CreateDocumentInput, CreateRowsInput, DeleteRowsInput, GetOutlineInput, GroupRowsInput,
    QueryRowsInput, UpdateRowsInput,
};
use super::script::Script;
use crate::error::{BridgeError, Result};

/// Bridge between typed operations and a running Bike instance.
#[derive(Clone)]
pub struct BikeBridge {
    executor: Arc<dyn ScriptExecutor>,
    commands: CommandBuilder,
}

impl BikeBridge {
    pub fn new(executor: Arc<dyn ScriptExecutor>, app_name: &str, encoding: Encoding) -> Self {
        Self {
            executor,
            commands: CommandBuilder::new(app_name, encoding),
        }
    }

    pub fn commands(&self) -> &CommandBuilder {
        &self.commands
    }

    // ── Gates ──

    async fn probe(&self, script: Script) -> bool {
        let result = executor::run(self.executor.as_ref(), &script).await;
        matches!(result.data, Some(ScriptData::Text(ref text)) if result.success && text == "true")
    }

    async fn ensure_running(&self) -> Result<()> {
        if self.probe(self.commands.probe_running()?).await {
            Ok(())
        } else {
            Err(BridgeError::HostUnreachable)
        }
    }

    async fn ensure_document(&self) -> Result<()> {
        self.ensure_running().await?;
        if self.probe(self.commands.probe_document()?).await {
            Ok(())
        } else {
            Err(BridgeError::NoOpenDocument)
        }
    }

    /// Execute and map to the caller's text. Failure keeps the raw
    /// executor message; success without output is `EmptyResult`.
    async fn execute(&self, operation: &'static str, script: &Script) -> Result<String> {
        let CommandResult {
            success,
            data,
            error,
        } = executor::run(self.executor.as_ref(), script).await;
        if !success {
            return Err(BridgeError::ExecutionFailure {
                operation,
                message: error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        data.map(ScriptData::into_text)
            .ok_or(BridgeError::EmptyResult)
    }

    // ── Operations ──

    pub async fn list_documents(&self) -> Result<String> {
        self.ensure_running().await?;
        let script = self.commands.list_documents()?;
        self.execute("list documents", &script).await
    }

    pub async fn get_outline(&self, input: GetOutlineInput) -> Result<String> {
        self.ensure_document().await?;
        let script = self.commands.get_outline(input.max_depth)?;
        self.execute("get document outline", &script).await
    }

    /// Only needs the host running; the new document becomes the open one.
    pub async fn create_document(&self, input: CreateDocumentInput) -> Result<String> {
        self.ensure_running().await?;
        let script = self.commands.create_document(&input.structure)?;
        self.execute("create document", &script).await
    }

    pub async fn create_rows(&self, input: CreateRowsInput) -> Result<String> {
        self.ensure_document().await?;
        let point = insertion_point(
            input.position,
            input.parent_id.as_deref(),
            input.reference_id.as_deref(),
        )?;
        let script = self.commands.create_rows(&input.structure, &point)?;
        self.execute("create rows", &script).await
    }

    pub async fn group_rows(&self, input: GroupRowsInput) -> Result<String> {
        self.ensure_document().await?;
        check_reference(input.position, input.reference_id.as_deref())?;

        let target = match (input.parent_id.as_deref(), input.group_name) {
            (Some(parent), _) => GroupTarget::Existing(RowId::parse(parent)?),
            (None, Some(name)) => {
                let point = match (input.position, input.row_ids.first()) {
                    (Some(position), _) => {
                        insertion_point(position, None, input.reference_id.as_deref())?
                    }
                    // Group in place: just before the first listed row, in
                    // whatever parent it has when the payload runs.
                    (None, Some(first)) => InsertionPoint::Before(RowId::parse(first)?),
                    (None, None) => {
                        return Err(BridgeError::invalid_argument(
                            "row_ids must contain at least one ID",
                        ))
                    }
                };
                GroupTarget::New { name, point }
            }
            (None, None) => {
                return Err(BridgeError::invalid_argument(
                    "Either group_name or parent_id must be provided",
                ))
            }
        };
        let row_ids = validate_identifiers(&input.row_ids)?;

        let script = self.commands.group_rows(&row_ids, &target)?;
        self.execute("group rows", &script).await
    }

    /// In-place updates run as one payload; markup updates run one payload
    /// each, in input order, after it.
    pub async fn update_rows(&self, input: UpdateRowsInput) -> Result<String> {
        self.ensure_document().await?;

        let steps = input
            .updates
            .into_iter()
            .map(|update| {
                let row_id = RowId::parse(&update.row_id)?;
                if update.name.is_none() && update.row_type.is_none() {
                    return Err(BridgeError::invalid_argument(format!(
                        "Update for row {row_id}: at least one of 'name' or 'type' must be provided"
                    )));
                }
                if update.html && update.name.is_none() {
                    return Err(BridgeError::invalid_argument(format!(
                        "Update for row {row_id}: 'html' requires 'name'"
                    )));
                }
                Ok(UpdateStep {
                    row_id,
                    name: update.name,
                    row_type: update.row_type,
                    html: update.html,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let plan = self.commands.update_rows(&steps)?;

        let mut in_place = 0;
        if let Some((count, script)) = &plan.in_place {
            self.execute("update rows", script).await?;
            in_place = *count;
        }

        let mut replaced = Vec::with_capacity(plan.reimports.len());
        for (row_id, script) in &plan.reimports {
            let new_id = self.execute("update rows", script).await?;
            tracing::debug!(old = %row_id, new = %new_id, "row re-imported");
            replaced.push(format!("{row_id} -> {new_id}"));
        }

        let total = in_place + replaced.len();
        let mut detail = format!("{in_place} in place");
        if !replaced.is_empty() {
            detail.push_str(&format!(
                ", {} re-imported: {}",
                replaced.len(),
                replaced.join(", ")
            ));
        }
        Ok(format!("Updated {total} row(s) ({detail})"))
    }

    pub async fn delete_rows(&self, input: DeleteRowsInput) -> Result<String> {
        self.ensure_document().await?;
        let row_ids = validate_identifiers(&input.row_ids)?;
        let script = self.commands.delete_rows(&row_ids)?;
        self.execute("delete rows", &script).await
    }

    pub async fn query_rows(&self, input: QueryRowsInput) -> Result<String> {
        self.ensure_document().await?;
        let script = self.commands.query_rows(&input.outline_path)?;
        self.execute("query rows", &script).await
    }
}

fn missing_reference(position: Position) -> BridgeError {
    BridgeError::invalid_argument(format!(
        "reference_id is required when position is '{}'",
        position.as_str()
    ))
}

fn check_reference(position: Option<Position>, reference_id: Option<&str>) -> Result<()> {
    match position {
        Some(position) if position.needs_reference() && reference_id.is_none() => {
            Err(missing_reference(position))
        }
        _ => Ok(()),
    }
}

/// Resolve `{parent_id?, position, reference_id?}`. Sibling positions only
/// name the reference row; its parent is looked up by the payload.
fn insertion_point(
    position: Position,
    parent_id: Option<&str>,
    reference_id: Option<&str>,
) -> Result<InsertionPoint> {
    check_reference(Some(position), reference_id)?;
    let parent = parent_id.map(RowId::parse).transpose()?;
    let reference = reference_id.map(RowId::parse).transpose()?;
    match (position, reference) {
        (Position::First, _) => Ok(InsertionPoint::FrontOf(parent)),
        (Position::Last, _) => Ok(InsertionPoint::EndOf(parent)),
        (Position::Before, Some(reference)) => Ok(InsertionPoint::Before(reference)),
        (Position::After, Some(reference)) => Ok(InsertionPoint::After(reference)),
        (position, None) => Err(missing_reference(position)),
    }
}
