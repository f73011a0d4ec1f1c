//! MCP server implementation.
//!
//! This module provides the adapter between JSON-RPC and the operation
//! registry, plus the stdio transport. Every `tools/call` runs in its own
//! task so slow backend calls do not hold up the rest of the session, and a
//! single writer task keeps response lines from interleaving.

use crate::context::ConnectionContext;
use crate::error::McpError;
use crate::protocol::*;
use crate::registry::OperationRegistry;
use mongo_mcp_core::McpConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// The MCP server.
pub struct McpServer {
    config: McpConfig,
    context: ConnectionContext,
    registry: OperationRegistry,
    in_flight: Mutex<HashMap<String, AbortHandle>>,
}

impl McpServer {
    /// Create a new MCP server over an assembled registry.
    pub fn new(config: McpConfig, context: ConnectionContext, registry: OperationRegistry) -> Self {
        Self {
            config,
            context,
            registry,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Serve on the process's stdin and stdout.
    pub async fn run(self: Arc<Self>) -> Result<(), McpError> {
        tracing::info!(
            tool_count = self.registry.len(),
            "Starting MCP server with stdio transport"
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC until the reader reaches EOF.
    ///
    /// Malformed lines are answered and skipped. Calls still running when
    /// input ends, or when the reader fails, are aborted.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let outcome = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(McpError::from(e)),
            }

            let request = match parse_request(&buf) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };

            if request.method == "tools/call" && !request.is_notification() {
                self.spawn_call(request, tx.clone());
            } else if let Some(response) = self.handle_request(request).await {
                let _ = tx.send(response);
            }
        };

        match &outcome {
            Ok(()) => tracing::info!("Input closed, shutting down MCP server"),
            Err(e) => tracing::error!(error = %e, "Failed to read input, shutting down"),
        }
        self.abort_in_flight();
        drop(tx);

        let written = writer_task
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?;
        outcome.and(written)
    }

    fn spawn_call(
        self: &Arc<Self>,
        request: JsonRpcRequest,
        tx: mpsc::UnboundedSender<JsonRpcResponse>,
    ) {
        let key = request_key(request.id.as_ref());
        let server = Arc::clone(self);
        let task_key = key.clone();

        // Hold the table while spawning so the task cannot finish before it
        // is recorded.
        let mut in_flight = self.lock_in_flight();
        if in_flight.contains_key(&key) {
            tracing::warn!(request_id = %key, "Request id is already in flight");
            let _ = tx.send(JsonRpcResponse::error(
                request.id,
                codes::INVALID_REQUEST,
                format!("Invalid request: id {} is already in flight", key),
            ));
            return;
        }
        let handle = tokio::spawn(async move {
            let response = server.handle_call_tool(request.id, request.params).await;
            server.lock_in_flight().remove(&task_key);
            let _ = tx.send(response);
        });
        in_flight.insert(key, handle.abort_handle());
    }

    /// Abort an in-flight call. Returns whether a call was found.
    pub fn cancel(&self, request_id: &Value) -> bool {
        match self.lock_in_flight().remove(&request_key(Some(request_id))) {
            Some(handle) => {
                handle.abort();
                tracing::info!(request_id = %request_id, "Cancelled in-flight tool call");
                true
            }
            None => false,
        }
    }

    fn abort_in_flight(&self) {
        let mut in_flight = self.lock_in_flight();
        if !in_flight.is_empty() {
            tracing::info!(count = in_flight.len(), "Aborting in-flight tool calls");
        }
        for (_, handle) in in_flight.drain() {
            handle.abort();
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle a JSON-RPC request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                tracing::debug!("Client initialized");
            }
            "notifications/cancelled" => {
                let params = request
                    .params
                    .clone()
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                match params {
                    Some(params) => {
                        if !self.cancel(&params.request_id) {
                            tracing::debug!(
                                request_id = %params.request_id,
                                "Cancellation for a call that is not running"
                            );
                        }
                    }
                    None => tracing::warn!("Malformed cancellation notification"),
                }
            }
            other => {
                tracing::debug!(method = %other, "Ignoring notification");
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": ServerInfo {
                name: self.config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResponse {
            tools: self.registry.tool_definitions(),
        };
        to_response(id, &result)
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        codes::INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    );
                }
            },
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        let Some(descriptor) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                McpError::ToolNotFound { name: params.name }.to_string(),
            );
        };

        tracing::debug!(tool = %descriptor.name, "Calling tool");
        let call = descriptor.invoke(&self.context, params.arguments);
        let outcome = match self.config.request_timeout() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        tool = %descriptor.name,
                        timeout_secs = limit.as_secs(),
                        "Tool call timed out"
                    );
                    let message = format!("operation timed out after {}s", limit.as_secs());
                    return to_response(id, &CallToolResponse::failure(message));
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(output) => to_response(id, &CallToolResponse::structured(output)),
            Err(e) if e.is_decode_error() => {
                JsonRpcResponse::error(id, codes::INVALID_PARAMS, e.to_string())
            }
            Err(e) => {
                tracing::warn!(tool = %descriptor.name, error = %e, "Tool call failed");
                to_response(id, &CallToolResponse::failure(e.to_string()))
            }
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, json!(null))
    }
}

/// Parse one raw input line, or produce the error response for it.
///
/// Blank lines yield `Ok(None)`. Bytes that are not UTF-8 fail JSON parsing
/// like any other malformed input.
fn parse_request(line: &[u8]) -> Result<Option<JsonRpcRequest>, JsonRpcResponse> {
    if line.trim_ascii().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(line).map_err(|e| {
        tracing::warn!(error = %e, "Unparseable input line");
        JsonRpcResponse::error(None, codes::PARSE_ERROR, format!("Parse error: {}", e))
    })?;

    let id = value.get("id").cloned();
    serde_json::from_value(value).map(Some).map_err(|e| {
        JsonRpcResponse::error(id, codes::INVALID_REQUEST, format!("Invalid request: {}", e))
    })
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Key identifying a request in the in-flight table.
fn request_key(id: Option<&Value>) -> String {
    id.map(Value::to_string).unwrap_or_default()
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    mut writer: W,
) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            tracing::error!(error = %e, "Failed to write response");
            return Err(e.into());
        }
        writer.flush().await?;
    }
    Ok(())
}
