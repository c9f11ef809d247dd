//! Ollama provider implemented over the OpenAI-compatible transport.

use std::sync::Arc;

use reqwest::Client;

use crate::adapters::openai::{
    OpenAiAuth, OpenAiHttpTransport, OpenAiTransport, build_openai_request, stream_model_events,
};
use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId,
};

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Clone)]
pub struct OllamaProvider {
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
}

impl OllamaProvider {
    pub fn new(transport: Arc<dyn OpenAiTransport>) -> Self {
        Self {
            transport,
            fallback_model: "llama3.2".to_string(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub fn default_http_transport(client: Client) -> OpenAiHttpTransport {
        OpenAiHttpTransport::new(client).with_base_url(OLLAMA_BASE_URL)
    }
}

impl ModelProvider for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let ollama_request = build_openai_request(request, &self.fallback_model, false);
            let response = self
                .transport
                .complete(ollama_request, OpenAiAuth::Anonymous)
                .await?;

            Ok(response.into_model_response(ProviderId::Ollama))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let ollama_request = build_openai_request(request, &self.fallback_model, true);
            stream_model_events(
                self.transport.as_ref(),
                ollama_request,
                OpenAiAuth::Anonymous,
                ProviderId::Ollama,
            )
            .await
        })
    }
}
