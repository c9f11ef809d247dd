//! Newline-delimited JSON-RPC 2.0 sessions with a tool server over stdio.
//!
//! A session is a child process plus its piped stdin/stdout. Sessions are
//! short-lived: callers open one, do a single unit of work, and close it.

use std::process::Stdio;
use std::time::Duration;

use lcommon::BoxFuture;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::{CallToolResult, McpError, ServerParameters, ToolSchema};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// One live conversation with a tool server.
pub trait McpSession: Send {
    /// `initialize` handshake followed by `notifications/initialized`.
    fn initialize<'a>(&'a mut self) -> BoxFuture<'a, Result<(), McpError>>;

    fn list_tools<'a>(&'a mut self) -> BoxFuture<'a, Result<Vec<ToolSchema>, McpError>>;

    fn call_tool<'a>(
        &'a mut self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, Result<CallToolResult, McpError>>;

    /// Tears the session down. Never fails; problems are logged.
    fn close(self: Box<Self>) -> BoxFuture<'static, ()>;
}

/// Opens sessions. The seam tests replace to avoid spawning processes.
pub trait McpConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        server: &'a ServerParameters,
    ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>>;
}

#[derive(Debug, Clone)]
pub struct StdioConnector {
    request_timeout: Duration,
}

impl Default for StdioConnector {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl StdioConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl McpConnector for StdioConnector {
    fn connect<'a>(
        &'a self,
        server: &'a ServerParameters,
    ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>> {
        Box::pin(async move {
            let session = StdioSession::spawn(server, self.request_timeout)?;
            Ok(Box::new(session) as Box<dyn McpSession>)
        })
    }
}

pub(crate) struct StdioSession {
    label: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    id: Option<Value>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolSchema>,
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

impl StdioSession {
    fn spawn(server: &ServerParameters, request_timeout: Duration) -> Result<Self, McpError> {
        let label = server.command_line();
        let mut command = Command::new(&server.command);
        command
            .args(&server.args)
            .envs(&server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|error| McpError::spawn(format!("failed to start '{label}': {error}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::spawn(format!("'{label}' has no stdin pipe")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::spawn(format!("'{label}' has no stdout pipe")))?;

        debug!(server = %label, pid = ?child.id(), "tool server started");

        Ok(Self {
            label,
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            request_timeout,
        })
    }

    async fn write_message(&mut self, message: &Value) -> Result<(), McpError> {
        let mut line = message.to_string();
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|error| McpError::io(format!("write to '{}' failed: {error}", self.label)))?;
        self.stdin
            .flush()
            .await
            .map_err(|error| McpError::io(format!("flush to '{}' failed: {error}", self.label)))
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<(), McpError> {
        let message = json!({"jsonrpc": "2.0", "method": method, "params": params});
        self.write_message(&message).await
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id;
        self.next_id += 1;

        let message = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        self.write_message(&message).await?;

        let timeout = self.request_timeout;
        match tokio::time::timeout(timeout, self.read_response(id)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::timeout(format!(
                "{method} to '{}' timed out after {}s",
                self.label,
                timeout.as_secs()
            ))),
        }
    }

    /// Reads lines until the response for `id` arrives. Blank lines,
    /// non-JSON output, notifications, and responses to other ids are skipped.
    async fn read_response(&mut self, id: u64) -> Result<Value, McpError> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|error| McpError::io(format!("read from '{}' failed: {error}", self.label)))?
                .ok_or_else(|| McpError::closed(format!("'{}' closed its stdout", self.label)))?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) else {
                debug!(server = %self.label, line = trimmed, "skipping non-JSON-RPC output");
                continue;
            };

            if response.id.as_ref().and_then(Value::as_u64) != Some(id) {
                debug!(server = %self.label, line = trimmed, "skipping unrelated message");
                continue;
            }

            if let Some(error) = response.error {
                return Err(McpError::server(error.code, error.message));
            }

            return response
                .result
                .ok_or_else(|| McpError::protocol(format!("response {id} carried no result")));
        }
    }
}

impl McpSession for StdioSession {
    fn initialize<'a>(&'a mut self) -> BoxFuture<'a, Result<(), McpError>> {
        Box::pin(async move {
            let params = json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "llmcli",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            });
            self.request("initialize", params).await?;
            self.notify("notifications/initialized", json!({})).await
        })
    }

    fn list_tools<'a>(&'a mut self) -> BoxFuture<'a, Result<Vec<ToolSchema>, McpError>> {
        Box::pin(async move {
            let mut tools = Vec::new();
            let mut cursor: Option<String> = None;

            loop {
                let params = match &cursor {
                    Some(cursor) => json!({"cursor": cursor}),
                    None => json!({}),
                };
                let result = self.request("tools/list", params).await?;
                let page: ListToolsResult = serde_json::from_value(result).map_err(|error| {
                    McpError::protocol(format!("invalid tools/list result: {error}"))
                })?;

                tools.extend(page.tools);
                match page.next_cursor {
                    Some(next) if !next.is_empty() => cursor = Some(next),
                    _ => return Ok(tools),
                }
            }
        })
    }

    fn call_tool<'a>(
        &'a mut self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, Result<CallToolResult, McpError>> {
        Box::pin(async move {
            let result = self
                .request("tools/call", json!({"name": name, "arguments": arguments}))
                .await?;
            serde_json::from_value(result)
                .map_err(|error| McpError::protocol(format!("invalid tools/call result: {error}")))
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let Self {
                label,
                mut child,
                stdin,
                ..
            } = *self;

            // Closing stdin is the stdio transport's shutdown signal.
            drop(stdin);

            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!(server = %label, %status, "tool server exited"),
                Ok(Err(error)) => warn!(server = %label, %error, "waiting for tool server failed"),
                Err(_) => {
                    if let Err(error) = child.kill().await {
                        warn!(server = %label, %error, "failed to kill tool server");
                    } else {
                        debug!(server = %label, "tool server killed after shutdown grace");
                    }
                }
            }
        })
    }
}
