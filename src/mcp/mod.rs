//! MCP (Model Context Protocol) Server Module
//!
//! Exposes the Bike bridge as an MCP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP client                          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ MCP Protocol (JSON-RPC over stdio)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MCP Server (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Tools:                                                     │
//! │  ├── bike_list_documents   - Open documents, front marked   │
//! │  ├── bike_get_outline      - Front document as row lines    │
//! │  ├── bike_create_document  - New document, optional rows    │
//! │  ├── bike_create_rows      - Insert a nested structure      │
//! │  ├── bike_group_rows       - Move rows under a parent       │
//! │  ├── bike_update_rows      - Text / type / markup updates   │
//! │  ├── bike_delete_rows      - Delete rows and children       │
//! │  └── bike_query_rows       - Outline path query             │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼ osascript
//! ┌─────────────────────────────────────────────────────────────┐
//! │                             Bike                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cargo build --bin bike_mcp
//! BIKE_MCP_LOG=debug ./target/debug/bike_mcp
//! ```

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
