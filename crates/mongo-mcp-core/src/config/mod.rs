//! Configuration types for the mongo-mcp tool server.
//!
//! # Configuration file
//!
//! ```yaml
//! connection:
//!   url: mongodb://localhost:27017
//!   database: app
//! capabilities:
//!   read_only: true
//!   allow_aggregates: false
//! mcp:
//!   request_timeout_secs: 30
//! ```
//!
//! Every section is optional. The connection URL must be supplied by some
//! layer before the server can start.

pub mod capabilities;
pub mod connection;
pub mod mcp;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use capabilities::{Capabilities, parse_flag};
pub use connection::ConnectionConfig;
pub use mcp::McpConfig;

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Backend connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Startup-time capability gates.
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Tool server settings.
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Values collected from environment variables and command line flags.
///
/// `None` means "not set at this layer"; the file layer value is kept.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_url: Option<String>,
    pub db_name: Option<String>,
    pub read_only: Option<bool>,
    pub allow_aggregates: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `path` if the file exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Fold environment and CLI values over this configuration.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.db_url {
            self.connection.url = Some(url);
        }
        if let Some(name) = overrides.db_name {
            self.connection.database = Some(name);
        }
        if let Some(read_only) = overrides.read_only {
            self.capabilities.read_only = read_only;
        }
        if let Some(allow) = overrides.allow_aggregates {
            self.capabilities.allow_aggregates = allow;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.mcp.request_timeout_secs = Some(secs);
        }
        self
    }

    /// Check that everything required to start is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.require_url().map(|_| ())
    }
}
