//! A tool server's tool wrapped as a [`Tool`].
//!
//! Holds no connection. Every invocation spawns the server, performs the
//! handshake, makes exactly one `tools/call`, and tears the session down
//! whatever the outcome.

use std::sync::Arc;

use lprovider::ToolDefinition;
use ltooling::{
    Tool, ToolError, ToolExecutionContext, ToolFuture, parse_json_value, validate_arguments,
};
use serde_json::Value;
use tracing::debug;

use crate::{CallToolResult, McpConnector, McpError, McpSession, ServerParameters, ToolSchema};

#[derive(Clone)]
pub struct McpTool {
    schema: ToolSchema,
    server: ServerParameters,
    connector: Arc<dyn McpConnector>,
}

impl McpTool {
    pub fn new(schema: ToolSchema, server: ServerParameters, connector: Arc<dyn McpConnector>) -> Self {
        Self {
            schema,
            server,
            connector,
        }
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub fn server(&self) -> &ServerParameters {
        &self.server
    }

    /// Validates `arguments` against the input schema, then runs one call.
    /// A result flagged `isError` fails with [`ltooling::ToolErrorKind::Invocation`]
    /// carrying the server's text.
    pub async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        validate_arguments(&self.schema.input_schema, &arguments)?;

        debug!(tool = %self.schema.name, server = %self.server.command_line(), "calling tool");
        let result = self.call_once(arguments).await?;

        if result.is_error {
            return Err(ToolError::invocation(result.render_text()));
        }

        Ok(result.render_text())
    }

    async fn call_once(&self, arguments: Value) -> Result<CallToolResult, McpError> {
        let mut session = self.connector.connect(&self.server).await?;
        let outcome = initialize_and_call(session.as_mut(), &self.schema.name, arguments).await;
        session.close().await;
        outcome
    }
}

async fn initialize_and_call(
    session: &mut dyn McpSession,
    name: &str,
    arguments: Value,
) -> Result<CallToolResult, McpError> {
    session.initialize().await?;
    session.call_tool(name, arguments).await
}

impl std::fmt::Debug for McpTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpTool")
            .field("name", &self.schema.name)
            .field("server", &self.server.command)
            .finish()
    }
}

impl Tool for McpTool {
    fn definition(&self) -> ToolDefinition {
        self.schema.to_definition()
    }

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let arguments = parse_json_value(args_json)?;
            self.call(arguments).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use lcommon::BoxFuture;
    use ltooling::ToolErrorKind;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().expect("journal lock").push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().expect("journal lock").clone()
        }
    }

    struct FakeConnector {
        journal: Arc<Journal>,
        result: Result<CallToolResult, McpError>,
    }

    struct FakeSession {
        journal: Arc<Journal>,
        result: Result<CallToolResult, McpError>,
    }

    impl McpConnector for FakeConnector {
        fn connect<'a>(
            &'a self,
            server: &'a ServerParameters,
        ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>> {
            Box::pin(async move {
                self.journal.push(format!("connect:{}", server.command));
                Ok(Box::new(FakeSession {
                    journal: Arc::clone(&self.journal),
                    result: self.result.clone(),
                }) as Box<dyn McpSession>)
            })
        }
    }

    impl McpSession for FakeSession {
        fn initialize<'a>(&'a mut self) -> BoxFuture<'a, Result<(), McpError>> {
            Box::pin(async move {
                self.journal.push("initialize");
                Ok(())
            })
        }

        fn list_tools<'a>(&'a mut self) -> BoxFuture<'a, Result<Vec<ToolSchema>, McpError>> {
            Box::pin(async move { Ok(Vec::new()) })
        }

        fn call_tool<'a>(
            &'a mut self,
            name: &'a str,
            arguments: Value,
        ) -> BoxFuture<'a, Result<CallToolResult, McpError>> {
            Box::pin(async move {
                self.journal.push(format!("call:{name}:{arguments}"));
                self.result.clone()
            })
        }

        fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
            Box::pin(async move { self.journal.push("close") })
        }
    }

    fn fetch_tool(result: Result<CallToolResult, McpError>) -> (McpTool, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let connector = Arc::new(FakeConnector {
            journal: Arc::clone(&journal),
            result,
        });
        let schema = ToolSchema::new(
            "fetch",
            "Fetches a URL",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string"},
                    "max_length": {"type": "integer"}
                },
                "required": ["url"]
            }),
        );

        (
            McpTool::new(schema, ServerParameters::new("uvx"), connector),
            journal,
        )
    }

    fn text_result(text: &str, is_error: bool) -> CallToolResult {
        CallToolResult {
            content: vec![json!({"type": "text", "text": text})],
            is_error,
        }
    }

    #[tokio::test]
    async fn each_call_opens_and_closes_its_own_session() {
        let (tool, journal) = fetch_tool(Ok(text_result("<html>", false)));
        let context = ToolExecutionContext::new("thread");

        for _ in 0..2 {
            let output = tool
                .invoke(r#"{"url":"https://example.com"}"#, &context)
                .await
                .expect("call should succeed");
            assert_eq!(output, "<html>");
        }

        let once = vec![
            "connect:uvx".to_string(),
            "initialize".to_string(),
            "call:fetch:{\"url\":\"https://example.com\"}".to_string(),
            "close".to_string(),
        ];
        assert_eq!(journal.events(), [once.clone(), once].concat());
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_server() {
        let (tool, journal) = fetch_tool(Ok(text_result("unused", false)));

        let error = tool
            .invoke(r#"{"link":"https://example.com"}"#, &ToolExecutionContext::new("t"))
            .await
            .expect_err("validation should fail");

        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
        assert!(journal.events().is_empty());
    }

    #[tokio::test]
    async fn integer_valued_float_reaches_the_server() {
        let (tool, journal) = fetch_tool(Ok(text_result("<html>", false)));

        tool.call(json!({"url": "https://example.com", "max_length": 5000.0}))
            .await
            .expect("whole-number float is a valid integer");

        assert!(journal.events().iter().any(|event| event.starts_with("call:fetch:")));
    }

    #[tokio::test]
    async fn remote_error_result_becomes_invocation_error() {
        let (tool, journal) = fetch_tool(Ok(text_result("404 Not Found", true)));

        let error = tool
            .call(json!({"url": "https://example.com/missing"}))
            .await
            .expect_err("remote error should fail");

        assert_eq!(error.kind, ToolErrorKind::Invocation);
        assert_eq!(error.message, "404 Not Found");
        assert_eq!(journal.events().last().map(String::as_str), Some("close"));
    }

    #[tokio::test]
    async fn session_is_closed_when_the_call_fails() {
        let (tool, journal) = fetch_tool(Err(McpError::timeout("tools/call timed out")));

        let error = tool
            .call(json!({"url": "https://example.com"}))
            .await
            .expect_err("timeout should fail");

        assert_eq!(error.kind, ToolErrorKind::Timeout);
        assert_eq!(journal.events().last().map(String::as_str), Some("close"));
    }
}
