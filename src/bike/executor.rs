//! Executor Adapter
//!
//! Runs payloads through an external script executor and normalizes what
//! comes back into a [`CommandResult`]. Nothing past this layer sees an
//! executor error directly.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::script::Script;
use crate::error::ExecError;

/// Raw process output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a payload to completion.
///
/// Implementations must bound their own wait and output size; the adapter
/// does not retry.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, script: &Script) -> Result<ExecOutput, ExecError>;
}

/// Host output, decided by a one-character sniff.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptData {
    Text(String),
    Structured(Value),
}

impl ScriptData {
    /// Classify trimmed output. `{`/`[` triggers a JSON parse; if that
    /// fails the text is kept as-is.
    pub fn sniff(trimmed: &str) -> Self {
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str(trimmed) {
                return ScriptData::Structured(value);
            }
        }
        ScriptData::Text(trimmed.to_string())
    }

    /// Text for the caller; structured data is pretty-printed.
    pub fn into_text(self) -> String {
        match self {
            ScriptData::Text(text) => text,
            ScriptData::Structured(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScriptData::Text(text) => Some(text),
            ScriptData::Structured(_) => None,
        }
    }
}

/// Uniform result of one executor round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    pub data: Option<ScriptData>,
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok(data: Option<ScriptData>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Execute `script` and normalize the outcome. Never fails.
pub async fn run(executor: &dyn ScriptExecutor, script: &Script) -> CommandResult {
    tracing::debug!(
        operation = script.operation(),
        bytes = script.source().len(),
        "running payload"
    );
    match executor.execute(script).await {
        Ok(output) => {
            let trimmed = output.stdout.trim();
            if trimmed.is_empty() {
                CommandResult::ok(None)
            } else {
                CommandResult::ok(Some(ScriptData::sniff(trimmed)))
            }
        }
        Err(e) => {
            tracing::warn!(operation = script.operation(), error = %e, "payload failed");
            CommandResult::failed(e.to_string())
        }
    }
}

/// Executor backed by `osascript`, one `-e` argument per payload line.
#[derive(Debug, Clone)]
pub struct OsaScriptExecutor {
    program: String,
    timeout: Duration,
    max_output: usize,
}

impl OsaScriptExecutor {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;

    pub fn new(program: impl Into<String>, timeout: Duration, max_output: usize) -> Self {
        Self {
            program: program.into(),
            timeout,
            max_output,
        }
    }

    fn command(&self, script: &Script) -> Command {
        let mut cmd = Command::new(&self.program);
        for line in script.lines() {
            cmd.arg("-e").arg(line);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn collect(&self, script: &Script) -> Result<ExecOutput, ExecError> {
        let mut child = self.command(script).spawn().map_err(|source| ExecError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => {
                // Kill on the first overflow; the other stream may never close.
                let read = tokio::try_join!(
                    read_capped(out, self.max_output),
                    read_capped(err, self.max_output)
                );
                match read {
                    Ok(streams) => streams,
                    Err(e) => {
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        return Err(e);
                    }
                }
            }
            _ => (Vec::new(), Vec::new()),
        };

        let status = child.wait().await?;
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        match status.code() {
            Some(0) => Ok(ExecOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr,
            }),
            Some(code) => Err(ExecError::NonZeroExit { code, stderr }),
            None => Err(ExecError::Terminated(status.to_string())),
        }
    }
}

/// Read a stream to EOF, failing as soon as it passes `max` bytes.
async fn read_capped<R: AsyncRead + Unpin>(reader: R, max: usize) -> Result<Vec<u8>, ExecError> {
    let mut buf = Vec::new();
    reader.take(max as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > max {
        return Err(ExecError::OutputTooLarge(max));
    }
    Ok(buf)
}

impl Default for OsaScriptExecutor {
    fn default() -> Self {
        Self::new("osascript", Self::DEFAULT_TIMEOUT, Self::DEFAULT_MAX_OUTPUT)
    }
}

#[async_trait]
impl ScriptExecutor for OsaScriptExecutor {
    async fn execute(&self, script: &Script) -> Result<ExecOutput, ExecError> {
        match tokio::time::timeout(self.timeout, self.collect(script)).await {
            Ok(result) => result,
            // Dropping the child future kills the process.
            Err(_) => Err(ExecError::Timeout(self.timeout.as_secs())),
        }
    }
}
