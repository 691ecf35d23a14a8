//! bike-mcp
//!
//! Exposes the Bike outliner to MCP clients: list and read documents,
//! create, move, update, delete and query rows. All document state lives in
//! Bike; this crate only validates, builds AppleScript and maps results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bike_mcp::bike::{BikeBridge, Encoding, OsaScriptExecutor};
//!
//! # async fn demo() -> bike_mcp::error::Result<()> {
//! let bridge = BikeBridge::new(Arc::new(OsaScriptExecutor::default()), "Bike", Encoding::Markup);
//! println!("{}", bridge.list_documents().await?);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Runtime configuration
pub mod config;

// Payload construction and execution
pub mod bike;

// MCP transport
pub mod mcp;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
