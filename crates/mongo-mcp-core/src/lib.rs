//! # mongo-mcp-core
//!
//! Configuration types shared by the mongo-mcp crates.
//!
//! Settings come from three layers, lowest precedence first:
//!
//! 1. an optional YAML file (`mongo-mcp.yaml`)
//! 2. environment variables (`DB_URL`, `DB_NAME`, `READ_ONLY`, `ALLOW_AGGREGATES`)
//! 3. command line flags
//!
//! Layers 2 and 3 are collected by the binary into a [`ConfigOverrides`] and
//! folded onto the file layer with [`ServerConfig::with_overrides`].

pub mod config;
pub mod error;

pub use config::{
    Capabilities, ConfigOverrides, ConnectionConfig, McpConfig, ServerConfig, parse_flag,
};
pub use error::ConfigError;
