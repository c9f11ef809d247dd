//! `llm`: ask a model a question and let it call tools served by MCP servers.
//!
//! This crate wires the workspace together and re-exports its crates so a
//! single dependency is enough to embed the agent.

pub mod cli;
pub mod config;
pub mod error;
pub mod providers;
pub mod render;
pub mod runtime;

pub use lchat;
pub use lcommon;
pub use lmcp;
pub use lmemory;
pub use lobserve;
pub use lprovider;
pub use ltooling;

pub use cli::{Cli, Query, resolve_query};
pub use config::{AppConfig, AppPaths, LlmConfig, resolve_config};
pub use error::CliError;
pub use providers::{ProviderSelection, build_provider, select_provider};
pub use render::{RenderState, ResponseRenderer};
pub use runtime::{Orchestrator, RunSettings, run_query};

pub mod prelude {
    pub use crate::{
        AppConfig, AppPaths, Cli, CliError, Orchestrator, Query, ResponseRenderer, RunSettings,
        resolve_query, run_query,
    };
    pub use lchat::{AgentEvent, AgentExecutor, AgentPolicy, AgentRunRequest};
    pub use lcommon::ThreadId;
    pub use lmcp::{ServerParameters, ToolCacheStore, ToolDiscovery};
    pub use lmemory::{MemoryBackend, ThreadStore};
}
