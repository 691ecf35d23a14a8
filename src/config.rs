//! Runtime configuration
//!
//! Every setting is a CLI flag with an environment fallback. `.env` is read
//! by the binary before parsing.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::bike::{BikeBridge, Encoding, OsaScriptExecutor};

pub const DEFAULT_APP_NAME: &str = "Bike";
pub const DEFAULT_OSASCRIPT: &str = "osascript";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// MCP server for the Bike outliner
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "bike_mcp", version)]
#[command(about = "MCP server exposing Bike outliner documents over stdio")]
pub struct BridgeConfig {
    /// Application name used in `tell application`
    #[arg(long, env = "BIKE_MCP_APP", default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Script executor program
    #[arg(long, env = "BIKE_MCP_OSASCRIPT", default_value = DEFAULT_OSASCRIPT)]
    pub osascript: String,

    /// Seconds to wait for one script before killing it
    #[arg(long, env = "BIKE_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Largest accepted script output, in bytes
    #[arg(long, env = "BIKE_MCP_MAX_OUTPUT", default_value_t = DEFAULT_MAX_OUTPUT)]
    pub max_output_bytes: usize,

    /// How create operations send structure to Bike
    #[arg(long, env = "BIKE_MCP_ENCODING", value_enum, default_value_t = Encoding::Markup)]
    pub encoding: Encoding,

    /// tracing filter directive (e.g. "info", "bike_mcp=debug")
    #[arg(long, env = "BIKE_MCP_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            osascript: DEFAULT_OSASCRIPT.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT,
            encoding: Encoding::Markup,
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn executor(&self) -> OsaScriptExecutor {
        OsaScriptExecutor::new(&self.osascript, self.timeout(), self.max_output_bytes)
    }

    /// A bridge backed by the configured `osascript` executor.
    pub fn bridge(&self) -> BikeBridge {
        BikeBridge::new(Arc::new(self.executor()), &self.app_name, self.encoding)
    }
}
