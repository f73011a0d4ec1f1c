//! Backend connection settings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Where to connect and which database to use when a request names none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection string (`DB_URL`). Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Default database (`DB_NAME`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// The connection string, treating an empty value as absent.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingConnectionUrl)
    }

    /// The default database, treating an empty value as absent.
    pub fn default_database(&self) -> Option<&str> {
        self.database.as_deref().filter(|name| !name.is_empty())
    }
}
