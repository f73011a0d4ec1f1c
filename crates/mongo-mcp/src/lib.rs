//! # mongo-mcp
//!
//! This crate provides an MCP server that exposes MongoDB collection
//! operations as typed tools for AI agents to consume. It supports:
//!
//! - **Capability Gating**: write and aggregate tools are registered only when enabled
//! - **Typed Contracts**: every tool advertises an input and an output JSON schema
//! - **Database Resolution**: per-request database name with a configured fallback
//! - **Cancellation**: in-flight calls can be cancelled or bounded by a timeout
//!
//! ## Architecture
//!
//! ```text
//! AI Agent (Claude, GPT, etc.)
//!       │
//!       │ MCP protocol (list tools / call tool)
//!       ▼
//! ┌──────────────────────┐
//! │  mongo-mcp server    │
//! │  1. Look up tool     │  ← OperationRegistry
//! │  2. Decode arguments │
//! │  3. Resolve database │  ← ConnectionContext
//! │  4. Execute          │  ← DocumentStore
//! │  5. Shape result     │
//! └──────────┬───────────┘
//!            │
//!            ▼
//!         MongoDB
//! ```
//!
//! ## Tools
//!
//! | Tool | Registered When |
//! |------|-----------------|
//! | `list_collections`, `count_documents`, `find_one`, `find` | always |
//! | `insert_*`, `update_*`, `delete_*`, `find_one_and_*` | not read-only |
//! | `aggregate` | aggregates allowed |
//!
//! ## Example Usage
//!
//! ```ignore
//! use mongo_mcp::{ConnectionContext, McpServer, MongoStore, OperationRegistry};
//! use mongo_mcp_core::{Capabilities, McpConfig};
//! use std::sync::Arc;
//!
//! let store = MongoStore::connect("mongodb://localhost:27017").await?;
//! let capabilities = Capabilities::new(false, true);
//! let context = ConnectionContext::new(Arc::new(store), Some("app".into()), capabilities);
//! let registry = OperationRegistry::from_capabilities(capabilities)?;
//!
//! Arc::new(McpServer::new(McpConfig::default(), context, registry))
//!     .run()
//!     .await?;
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod mongo;
pub mod operations;
pub mod options;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod shaping;

// Re-export main types
pub use backend::{
    DeleteSummary, DocumentStore, InsertManySummary, InsertOneSummary, Namespace, UpdateSummary,
};
pub use context::{ConnectionContext, Database, resolve_database_name};
pub use error::{BackendError, McpError, OperationError, RegistryError};
pub use mongo::MongoStore;
pub use operations::{Operation, OperationId};
pub use options::{AggregateSettings, PageBounds};
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcRequest, JsonRpcResponse, ToolAnnotations,
    ToolContent, ToolDefinition,
};
pub use registry::{OperationDescriptor, OperationRegistry, enabled_operations};
pub use server::McpServer;
