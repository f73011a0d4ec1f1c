//! MCP tool server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpConfig {
    /// Name reported in the `initialize` handshake.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Upper bound for a single tool call. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            request_timeout_secs: None,
        }
    }
}

impl McpConfig {
    /// Per-call timeout; zero is treated as unset.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_server_name() -> String {
    "mongo-mcp".to_string()
}
