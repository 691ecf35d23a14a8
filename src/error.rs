//! Error handling for the Bike bridge
//!
//! One taxonomy covers every operation. Failures are raised where they are
//! detected and rendered to the caller once, at the transport boundary.

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bike is not running. Please open Bike first.")]
    HostUnreachable,

    #[error("No document is open in Bike. Please open a document first.")]
    NoOpenDocument,

    #[error("{0}")]
    InvalidArgument(String),

    #[error(
        "Invalid row ID format: \"{0}\". IDs must be alphanumeric with hyphens/underscores only."
    )]
    InvalidIdentifier(String),

    #[error("Failed to {operation}: {message}")]
    ExecutionFailure {
        operation: &'static str,
        message: String,
    },

    #[error("No data returned from Bike")]
    EmptyResult,

    #[error("Script template slot '{slot}' was not bound")]
    Template { slot: String },
}

impl BridgeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::HostUnreachable => "host_unreachable",
            Self::NoOpenDocument => "no_open_document",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::ExecutionFailure { .. } => "execution_failure",
            Self::EmptyResult => "empty_result",
            Self::Template { .. } => "template",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures of the script executor process itself.
///
/// These never leave the executor adapter; they are flattened into a
/// failed `CommandResult` carrying the display text.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("script timed out after {0}s")]
    Timeout(u64),

    #[error("script output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("script exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("script terminated by signal: {0}")]
    Terminated(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
