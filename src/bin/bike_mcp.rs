//! Bike MCP Server Binary
//!
//! Speaks MCP on stdin/stdout. Logs go to stderr.
//!
//! Usage:
//!   bike_mcp [--app-name Bike] [--encoding markup|records] [--log-filter info]

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bike_mcp::mcp::McpServer;
use bike_mcp::BridgeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = BridgeConfig::parse();

    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_filter)?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        app = %config.app_name,
        encoding = ?config.encoding,
        timeout_secs = config.timeout_secs,
        "starting bike_mcp"
    );

    let server = McpServer::new(config.bridge());
    server.run().await
}
