//! One CLI invocation: thread selection, tool discovery, the agent run, and
//! rendering, wired from configuration.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use futures_util::StreamExt;
use lchat::{AgentExecutor, AgentPolicy, AgentRunRequest};
use lcommon::ThreadId;
use lmcp::{ServerParameters, StdioConnector, ToolCacheStore, ToolDiscovery};
use lmemory::{
    MemoryBackend, MemoryConversationStore, SqliteMemoryBackend, ThreadStore, new_thread_id,
};
use lobserve::CombinedObservabilityHooks;
use lprovider::ModelProvider;
use ltooling::{DefaultToolRuntime, ToolRegistry};

use crate::cli::Query;
use crate::config::{AppConfig, AppPaths, resolve_config};
use crate::error::CliError;
use crate::providers::build_provider;
use crate::render::ResponseRenderer;

/// Per-run model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            system_prompt: config.system_prompt_at(Local::now()),
        }
    }
}

pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    discovery: ToolDiscovery,
    memory: Arc<dyn MemoryBackend>,
    hooks: Arc<CombinedObservabilityHooks>,
    policy: AgentPolicy,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        discovery: ToolDiscovery,
        memory: Arc<dyn MemoryBackend>,
    ) -> Self {
        Self {
            provider,
            discovery,
            memory,
            hooks: Arc::new(CombinedObservabilityHooks::default()),
            policy: AgentPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AgentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs `query` to completion, writing the response to `out`, and
    /// records the thread it ran on as the last conversation.
    pub async fn run<W: Write>(
        &self,
        query: &Query,
        settings: &RunSettings,
        servers: &[ServerParameters],
        out: W,
    ) -> Result<ThreadId, CliError> {
        let threads = ThreadStore::new(Arc::clone(&self.memory));
        let thread_id = if query.continuation {
            threads.get_or_create().await?
        } else {
            new_thread_id()
        };
        tracing::debug!(thread_id = %thread_id, continuation = query.continuation, "starting run");

        let mut registry = ToolRegistry::new();
        for tool in self.discovery.discover(servers).await {
            let name = tool.schema().name.clone();
            if !registry.register(tool) {
                tracing::warn!(tool = %name, "duplicate tool name, keeping the first registered");
            }
        }

        let tool_runtime =
            DefaultToolRuntime::new(Arc::new(registry)).with_hooks(self.hooks.clone());
        let executor = AgentExecutor::builder(Arc::clone(&self.provider))
            .tool_runtime(Arc::new(tool_runtime))
            .store(Arc::new(MemoryConversationStore::new(Arc::clone(&self.memory))))
            .policy(self.policy.clone())
            .provider_hooks(self.hooks.clone())
            .build();

        let mut request =
            AgentRunRequest::new(thread_id.clone(), settings.model.clone(), query.text.clone())
                .with_temperature(settings.temperature);
        if let Some(system_prompt) = &settings.system_prompt {
            request = request.with_system_prompt(system_prompt.clone());
        }

        let mut renderer = ResponseRenderer::new(out);
        let mut events = executor.run(request);
        while let Some(event) = events.next().await {
            renderer.handle(&event?)?;
        }
        drop(events);
        renderer.finish()?;

        threads.save(&thread_id).await?;
        Ok(thread_id)
    }
}

/// Resolves configuration and runs `query` against real providers, tool
/// servers, and the on-disk stores under `~/.llm`.
pub async fn run_query<W: Write>(
    config_path: Option<&Path>,
    query: &Query,
    out: W,
) -> Result<ThreadId, CliError> {
    let paths = AppPaths::from_home()?;
    let (path, config) = resolve_config(config_path, &paths)?;
    tracing::debug!(config = %path.display(), "loaded config");

    let servers = config.server_parameters()?;
    let api_key = config.llm.resolve_api_key(|name| std::env::var(name).ok());
    let provider = build_provider(&config.llm, api_key)?;
    let memory: Arc<dyn MemoryBackend> = Arc::new(SqliteMemoryBackend::new(&paths.database)?);
    let discovery = ToolDiscovery::new(
        ToolCacheStore::new(&paths.cache_dir),
        Arc::new(StdioConnector::new(config.tool_timeout())),
    );

    Orchestrator::new(provider, discovery, memory)
        .run(query, &RunSettings::from_config(&config), &servers, out)
        .await
}
