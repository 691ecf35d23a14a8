//! Bike outliner bridge
//!
//! Turns typed outline operations into AppleScript payloads for Bike and
//! maps what comes back.
//!
//! ```text
//! arguments ─► schema (validate) ─► ops (host / document gates)
//!                                      │
//!                                      ▼
//!                     commands + encode + sanitize ─► script
//!                                      │
//!                                      ▼
//!                        executor (osascript) ─► Bike
//! ```

pub mod commands;
pub mod encode;
pub mod executor;
pub mod model;
pub mod ops;
pub mod sanitize;
pub mod schema;
pub mod script;

pub use commands::{CommandBuilder, GroupTarget, UpdatePlan, UpdateStep};
pub use encode::{Encoding, TextMode};
pub use executor::{CommandResult, ExecOutput, OsaScriptExecutor, ScriptData, ScriptExecutor};
pub use model::{InsertionPoint, OutlineNode, Position, RowType, RowUpdate};
pub use ops::BikeBridge;
pub use sanitize::{escape_text, validate_identifier, validate_identifiers, EscapedText, RowId};
pub use schema::{parse_args, Validate};
pub use script::{Script, ScriptTemplate};
