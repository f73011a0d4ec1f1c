use anyhow::{Context, Result};
use clap::Parser;
use mongo_mcp::{ConnectionContext, McpServer, MongoStore, OperationRegistry};
use mongo_mcp_core::{ConfigOverrides, ServerConfig, parse_flag};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mongo-mcp",
    version,
    about = "MCP server exposing MongoDB collection operations over stdio"
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "mongo-mcp.yaml")]
    config: PathBuf,

    /// MongoDB connection string.
    #[arg(long, env = "DB_URL", hide_env_values = true)]
    db_url: Option<String>,

    /// Database used when a request does not name one.
    #[arg(long, env = "DB_NAME")]
    db_name: Option<String>,

    /// Hide every tool that can modify data.
    #[arg(
        long,
        env = "READ_ONLY",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = flag_value
    )]
    read_only: Option<bool>,

    /// Expose the aggregation pipeline tool.
    #[arg(
        long,
        env = "ALLOW_AGGREGATES",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = flag_value
    )]
    allow_aggregates: Option<bool>,

    /// Abort tool calls that run longer than this many seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            db_url: self.db_url.clone(),
            db_name: self.db_name.clone(),
            read_only: self.read_only,
            allow_aggregates: self.allow_aggregates,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

fn flag_value(raw: &str) -> Result<bool, Infallible> {
    Ok(parse_flag(raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.config.exists() {
        warn!(config = %cli.config.display(), "Config file not found, using defaults");
    }
    let config = ServerConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config file: {:?}", cli.config))?
        .with_overrides(cli.overrides());
    config.validate()?;

    let url = config.connection.require_url()?;
    let store = MongoStore::connect(url)
        .await
        .context("Failed to connect to MongoDB")?;

    let capabilities = config.capabilities;
    let context = ConnectionContext::new(
        Arc::new(store),
        config.connection.default_database().map(str::to_string),
        capabilities,
    );
    let registry = OperationRegistry::from_capabilities(capabilities)?;

    info!(
        read_only = capabilities.read_only,
        allow_aggregates = capabilities.allow_aggregates,
        default_database = ?context.default_database(),
        tool_count = registry.len(),
        "Registered MongoDB tools"
    );

    let server = Arc::new(McpServer::new(config.mcp.clone(), context, registry));
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_forms() {
        let cli =
            Cli::try_parse_from(["mongo-mcp", "--read-only", "--allow-aggregates=TRUE"]).unwrap();
        assert_eq!(cli.read_only, Some(true));
        assert_eq!(cli.allow_aggregates, Some(true));

        let cli =
            Cli::try_parse_from(["mongo-mcp", "--read-only=yes", "--allow-aggregates=1"]).unwrap();
        assert_eq!(cli.read_only, Some(false));
        assert_eq!(cli.allow_aggregates, Some(true));
    }

    #[test]
    fn test_overrides_carry_cli_values() {
        let cli = Cli::try_parse_from([
            "mongo-mcp",
            "--db-url",
            "mongodb://localhost:27017",
            "--db-name",
            "app",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();

        let config = ServerConfig::default().with_overrides(cli.overrides());
        assert_eq!(config.connection.require_url().unwrap(), "mongodb://localhost:27017");
        assert_eq!(config.connection.default_database(), Some("app"));
        assert_eq!(config.mcp.request_timeout_secs, Some(5));
    }
}
