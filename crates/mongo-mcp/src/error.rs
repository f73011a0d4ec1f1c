//! Error types for the mongo-mcp crate.

use thiserror::Error;

/// Errors that can occur in the MCP server itself (transport and dispatch).
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found.
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A failure reported by the backend store.
///
/// The message is the backend's own text, carried through unchanged so the
/// caller sees exactly what the driver said.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<mongodb::error::Error> for BackendError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors raised while executing a single operation.
///
/// None of these are fatal; each is returned to the caller as a tool-level
/// failure and the server keeps running.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Neither the request nor the configuration names a database.
    #[error("database selection is missing to execute the query")]
    MissingDatabaseSelection,

    /// A single-document operation matched nothing.
    #[error("no document matched the filter")]
    NotFound,

    /// Arguments do not fit the operation's input shape.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidInput { operation: String, reason: String },

    /// The backend rejected or failed the call.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The shaped output could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OperationError {
    /// Whether this error happened before the handler ran.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, OperationError::InvalidInput { .. })
    }
}

/// Errors raised while assembling the operation registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two descriptors share a name.
    #[error("operation registered twice: {name}")]
    DuplicateOperation { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_is_preserved() {
        let err = OperationError::from(BackendError::new("E11000 duplicate key error"));
        assert_eq!(err.to_string(), "E11000 duplicate key error");
    }

    #[test]
    fn test_decode_error_classification() {
        let err = OperationError::InvalidInput {
            operation: "find".to_string(),
            reason: "missing field `collection_name`".to_string(),
        };
        assert!(err.is_decode_error());
        assert!(!OperationError::NotFound.is_decode_error());
    }
}
