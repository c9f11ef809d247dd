//! Turns configured servers into invocable tools, preferring the cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{McpConnector, McpError, McpSession, McpTool, ServerParameters, ToolCacheStore, ToolSchema};

pub struct ToolDiscovery {
    cache: ToolCacheStore,
    connector: Arc<dyn McpConnector>,
}

impl ToolDiscovery {
    pub fn new(cache: ToolCacheStore, connector: Arc<dyn McpConnector>) -> Self {
        Self { cache, connector }
    }

    pub fn cache(&self) -> &ToolCacheStore {
        &self.cache
    }

    /// Tools of every server in the given order, each server's tools in
    /// advertised order. A server whose list cannot be fetched is logged and
    /// skipped.
    pub async fn discover(&self, servers: &[ServerParameters]) -> Vec<McpTool> {
        let mut tools = Vec::new();

        for server in servers {
            match self.server_tools(server).await {
                Ok(schemas) => tools.extend(schemas.into_iter().map(|schema| {
                    McpTool::new(schema, server.clone(), Arc::clone(&self.connector))
                })),
                Err(error) => warn!(
                    server = %server.command_line(),
                    %error,
                    "skipping tool server whose tools could not be listed"
                ),
            }
        }

        tools
    }

    async fn server_tools(&self, server: &ServerParameters) -> Result<Vec<ToolSchema>, McpError> {
        if let Some(cached) = self.cache.get(server).await {
            return Ok(cached);
        }

        info!("Gathering capability of {}", server.command_line());
        let schemas = self.fetch_live(server).await?;

        if let Err(error) = self.cache.put(server, &schemas).await {
            warn!(server = %server.command_line(), %error, "failed to cache tool list");
        }

        Ok(schemas)
    }

    async fn fetch_live(&self, server: &ServerParameters) -> Result<Vec<ToolSchema>, McpError> {
        let mut session = self.connector.connect(server).await?;
        let outcome = initialize_and_list(session.as_mut()).await;
        session.close().await;
        outcome
    }
}

async fn initialize_and_list(session: &mut dyn McpSession) -> Result<Vec<ToolSchema>, McpError> {
    session.initialize().await?;
    session.list_tools().await
}
