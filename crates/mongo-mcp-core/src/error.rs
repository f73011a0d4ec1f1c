//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while assembling the server configuration.
///
/// All of these are fatal: the process cannot start without a valid
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The connection endpoint was not provided by any layer.
    #[error("missing required environment variable: DB_URL")]
    MissingConnectionUrl,

    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::ServerConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
