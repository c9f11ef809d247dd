//! Auth resolution for OpenAI-compatible endpoints.

use crate::{ProviderError, ProviderId, SecureCredentialManager};

use super::types::OpenAiAuth;

/// Resolves request auth from the stored API key.
///
/// Endpoints that accept unauthenticated traffic fall back to
/// [`OpenAiAuth::Anonymous`] when no key is stored.
pub(crate) fn resolve_openai_auth(
    credentials: &SecureCredentialManager,
    allow_anonymous: bool,
) -> Result<OpenAiAuth, ProviderError> {
    if let Some(api_key) = credentials.api_key(ProviderId::OpenAi)? {
        return Ok(OpenAiAuth::ApiKey(api_key));
    }

    if allow_anonymous {
        return Ok(OpenAiAuth::Anonymous);
    }

    Err(ProviderError::authentication("no OpenAI API key configured"))
}
