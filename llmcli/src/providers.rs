//! Model provider construction from the `llm` config section.

use std::sync::Arc;

use lprovider::ModelProvider;

use crate::config::LlmConfig;
use crate::error::CliError;

/// Which adapter a provider name maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    OpenAi { base_url: Option<String> },
    Ollama { base_url: Option<String> },
    /// Any other provider name served at an OpenAI-compatible `base_url`.
    Compatible { name: String, base_url: String },
}

pub fn select_provider(llm: &LlmConfig) -> Result<ProviderSelection, CliError> {
    let name = llm.provider.trim().to_ascii_lowercase();
    match (name.as_str(), llm.base_url.clone()) {
        ("openai", base_url) => Ok(ProviderSelection::OpenAi { base_url }),
        ("ollama", base_url) => Ok(ProviderSelection::Ollama { base_url }),
        (_, Some(base_url)) => Ok(ProviderSelection::Compatible { name, base_url }),
        (_, None) => Err(CliError::Config(format!(
            "unsupported provider '{}'; set llm.base_url to use an OpenAI-compatible endpoint",
            llm.provider
        ))),
    }
}

/// Builds the provider for `llm`. OpenAI itself requires a key; Ollama and
/// other compatible endpoints work without one.
pub fn build_provider(
    llm: &LlmConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    match select_provider(llm)? {
        ProviderSelection::OpenAi { base_url } => {
            let api_key = api_key.ok_or_else(|| {
                CliError::Config(
                    "no API key for provider 'openai'; set llm.api_key or OPENAI_API_KEY".into(),
                )
            })?;
            build_openai_provider(llm, base_url, Some(api_key))
        }
        ProviderSelection::Compatible { base_url, .. } => {
            build_openai_provider(llm, Some(base_url), api_key)
        }
        ProviderSelection::Ollama { base_url } => build_ollama_provider(llm, base_url),
    }
}

#[cfg(feature = "provider-openai")]
fn http_client(llm: &LlmConfig) -> Result<reqwest::Client, CliError> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .read_timeout(llm.model_timeout())
        .build()
        .map_err(|err| CliError::Provider(err.to_string()))
}

#[cfg(feature = "provider-openai")]
fn build_openai_provider(
    llm: &LlmConfig,
    base_url: Option<String>,
    api_key: Option<String>,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    use lprovider::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};
    use lprovider::{ProviderId, SecureCredentialManager};

    let mut transport = OpenAiHttpTransport::new(http_client(llm)?);
    if let Some(base_url) = base_url {
        transport = transport.with_base_url(base_url);
    }

    let credentials = Arc::new(SecureCredentialManager::new());
    let mut provider = OpenAiProvider::new(Arc::clone(&credentials), Arc::new(transport))
        .with_fallback_model(llm.model.clone());
    match api_key {
        Some(api_key) => credentials.set_api_key(ProviderId::OpenAi, api_key)?,
        None => provider = provider.with_anonymous_access(),
    }

    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_provider(
    _llm: &LlmConfig,
    _base_url: Option<String>,
    _api_key: Option<String>,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    Err(CliError::Config(
        "provider-openai feature is not enabled on llmcli".into(),
    ))
}

#[cfg(feature = "provider-ollama")]
fn build_ollama_provider(
    llm: &LlmConfig,
    base_url: Option<String>,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    use lprovider::adapters::ollama::{OLLAMA_BASE_URL, OllamaProvider};
    use lprovider::adapters::openai::OpenAiHttpTransport;

    let transport = OpenAiHttpTransport::new(http_client(llm)?)
        .with_base_url(base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string()));
    Ok(Arc::new(
        OllamaProvider::new(Arc::new(transport)).with_fallback_model(llm.model.clone()),
    ))
}

#[cfg(not(feature = "provider-ollama"))]
fn build_ollama_provider(
    _llm: &LlmConfig,
    _base_url: Option<String>,
) -> Result<Arc<dyn ModelProvider>, CliError> {
    Err(CliError::Config(
        "provider-ollama feature is not enabled on llmcli".into(),
    ))
}
