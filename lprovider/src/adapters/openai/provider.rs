//! OpenAI provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, SecureCredentialManager,
};

use super::auth::resolve_openai_auth;
use super::transport::OpenAiTransport;
use super::types::{OpenAiAuth, OpenAiMessage, OpenAiRequest, OpenAiTool};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Clone)]
pub struct OpenAiProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
    allow_anonymous: bool,
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: DEFAULT_OPENAI_MODEL.to_string(),
            allow_anonymous: false,
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    /// Sends requests without an `Authorization` header when no key is stored.
    /// Used for self-hosted OpenAI-compatible servers.
    pub fn with_anonymous_access(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }

    fn auth(&self) -> Result<OpenAiAuth, ProviderError> {
        resolve_openai_auth(&self.credentials, self.allow_anonymous)
    }
}

/// Lowers a provider-agnostic request into the chat-completions shape.
/// A blank model name falls back to `fallback_model`.
pub(crate) fn build_openai_request(
    request: ModelRequest,
    fallback_model: &str,
    stream: bool,
) -> OpenAiRequest {
    let model = if request.model.trim().is_empty() {
        fallback_model.to_string()
    } else {
        request.model
    };

    OpenAiRequest {
        model,
        messages: request
            .messages
            .into_iter()
            .map(OpenAiMessage::from)
            .collect(),
        tools: request.tools.into_iter().map(OpenAiTool::from).collect(),
        temperature: request.options.temperature,
        max_tokens: request.options.max_tokens,
        stream,
    }
}

pub(crate) async fn stream_model_events<'a>(
    transport: &'a dyn OpenAiTransport,
    request: OpenAiRequest,
    auth: OpenAiAuth,
    provider: ProviderId,
) -> Result<BoxedEventStream<'a>, ProviderError> {
    let mut chunks = transport.stream(request, auth).await?;

    let stream = try_stream! {
        while let Some(chunk) = chunks.next().await {
            yield chunk?.into_stream_event(provider);
        }
    };

    Ok(Box::pin(stream) as BoxedEventStream<'a>)
}

impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = self.auth()?;
            let openai_request = build_openai_request(request, &self.fallback_model, false);
            let response = self.transport.complete(openai_request, auth).await?;
            Ok(response.into_model_response(ProviderId::OpenAi))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = self.auth()?;
            let openai_request = build_openai_request(request, &self.fallback_model, true);
            stream_model_events(self.transport.as_ref(), openai_request, auth, ProviderId::OpenAi)
                .await
        })
    }
}
