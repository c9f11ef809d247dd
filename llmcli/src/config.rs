//! Configuration file discovery, parsing, and derived settings.
//!
//! ```rust
//! use llmcli::config::AppConfig;
//!
//! let config = AppConfig::from_json(r#"{"mcpServers": {"fetch": {"command": "uvx"}}}"#)
//!     .expect("valid config");
//! assert_eq!(config.llm.provider, "openai");
//! assert_eq!(config.server_parameters().expect("servers").len(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use lmcp::ServerParameters;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CliError;

pub const CONFIG_FILE: &str = "mcp-server-config.json";
const TODAY_PLACEHOLDER: &str = "{today_datetime}";

/// Filesystem locations under `~/.llm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub database: PathBuf,
}

impl AppPaths {
    pub fn under(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            cache_dir: config_dir.join("mcp-tools"),
            database: config_dir.join("conversations.db"),
            config_dir,
        }
    }

    pub fn from_home() -> Result<Self, CliError> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("could not determine the home directory".into()))?;
        Ok(Self::under(home.join(".llm")))
    }

    pub fn user_config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub llm: LlmConfig,
    /// Server name to launch parameters, in file order.
    #[serde(default)]
    pub mcp_servers: Map<String, Value>,
    #[serde(default = "default_tool_timeout_seconds")]
    pub tool_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            temperature: 0.0,
            base_url: None,
            timeout_seconds: default_model_timeout_seconds(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_model_timeout_seconds() -> u64 {
    120
}

fn default_tool_timeout_seconds() -> u64 {
    30
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, CliError> {
        serde_json::from_str(text).map_err(|err| CliError::Config(format!("invalid config: {err}")))
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            CliError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|err| CliError::Config(format!("invalid config {}: {err}", path.display())))
    }

    /// Launch parameters for every configured server, in file order.
    pub fn server_parameters(&self) -> Result<Vec<ServerParameters>, CliError> {
        self.mcp_servers
            .iter()
            .map(|(name, value)| {
                serde_json::from_value::<ServerParameters>(value.clone()).map_err(|err| {
                    CliError::Config(format!("invalid mcpServers entry '{name}': {err}"))
                })
            })
            .collect()
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }

    /// The system prompt with `{today_datetime}` filled in, if one is set.
    pub fn system_prompt_at(&self, now: DateTime<Local>) -> Option<String> {
        let today = now.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        self.system_prompt
            .as_ref()
            .map(|prompt| prompt.replace(TODAY_PLACEHOLDER, &today))
    }
}

impl LlmConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `llm.api_key`, else `OPENAI_API_KEY` for openai or `<PROVIDER>_API_KEY`
    /// for any other provider. Blank values count as missing.
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let configured = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        if let Some(key) = configured {
            return Some(key.to_string());
        }

        let variable = format!("{}_API_KEY", self.provider.to_ascii_uppercase().replace('-', "_"));
        lookup(&variable)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Where to look for the config file, highest priority first.
pub fn config_candidates(explicit: Option<&Path>, paths: &AppPaths) -> Vec<PathBuf> {
    match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => vec![PathBuf::from(CONFIG_FILE), paths.user_config_file()],
    }
}

/// Loads the first existing candidate.
pub fn resolve_config(
    explicit: Option<&Path>,
    paths: &AppPaths,
) -> Result<(PathBuf, AppConfig), CliError> {
    let candidates = config_candidates(explicit, paths);
    let found = candidates.iter().find(|path| path.is_file()).cloned();

    match found {
        Some(path) => {
            let config = AppConfig::load(&path)?;
            Ok((path, config))
        }
        None => {
            let searched = candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::Config(format!(
                "could not find config file in any of: {searched}"
            )))
        }
    }
}
