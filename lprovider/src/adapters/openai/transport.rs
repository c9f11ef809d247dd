//! OpenAI transport trait and reqwest-based HTTP implementation.

use std::collections::BTreeMap;
use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::{ProviderError, ProviderFuture};

use super::serde_api::{
    OpenAiApiResponse, OpenAiApiStreamResponse, build_api_request, delta_content_chunk,
    extract_error_message, parse_finish_reason,
};
use super::types::{
    OpenAiAssistantMessage, OpenAiAuth, OpenAiFinishReason, OpenAiRequest, OpenAiResponse,
    OpenAiStreamChunk, OpenAiToolCall, OpenAiUsage,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub type OpenAiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<OpenAiStreamChunk, ProviderError>> + Send + 'a>>;

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn apply_auth(
        &self,
        builder: reqwest::RequestBuilder,
        auth: &OpenAiAuth,
    ) -> reqwest::RequestBuilder {
        match auth {
            OpenAiAuth::ApiKey(key) => builder.bearer_auth(key.expose()),
            OpenAiAuth::Anonymous => builder,
        }
    }

    async fn send(
        &self,
        request: OpenAiRequest,
        auth: &OpenAiAuth,
    ) -> Result<Response, ProviderError> {
        let api_request = build_api_request(request)?;
        let builder = self
            .client
            .post(self.endpoint("chat/completions"))
            .json(&api_request);
        let response = self
            .apply_auth(builder, auth)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("chat completion request failed with status {status}"));

        ProviderError::from_http_status(status.as_u16(), message)
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(error.to_string())
    } else {
        ProviderError::transport(error.to_string())
    }
}

/// Pops the next complete line off `buffer`. Splitting on raw bytes keeps
/// multi-byte characters intact when they straddle network chunks.
pub(crate) fn next_sse_line(buffer: &mut Vec<u8>) -> Option<Result<String, ProviderError>> {
    let newline_index = buffer.iter().position(|byte| *byte == b'\n')?;
    let line = buffer.drain(..=newline_index).collect::<Vec<u8>>();
    Some(
        String::from_utf8(line)
            .map(|line| line.trim().to_string())
            .map_err(|err| ProviderError::transport(err.to_string())),
    )
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiResponse, ProviderError>> {
        Box::pin(async move {
            let response = self.send(request, &auth).await?;
            let parsed: OpenAiApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            OpenAiResponse::try_from(parsed)
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let model_for_fallback = request.model.clone();
            let response = self.send(request, &auth).await?;

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut sse_buffer = Vec::<u8>::new();
                let mut finished = false;
                let mut content = String::new();
                let mut tool_calls: BTreeMap<u32, OpenAiToolCall> = BTreeMap::new();
                let mut model = None::<String>;
                let mut finish_reason = OpenAiFinishReason::Other;
                let mut usage = OpenAiUsage::default();

                while let Some(item) = chunks.next().await {
                    let bytes = item.map_err(map_reqwest_error)?;
                    sse_buffer.extend_from_slice(&bytes);

                    while let Some(line) = next_sse_line(&mut sse_buffer) {
                        let line = line?;
                        let Some(payload) = line.strip_prefix("data:") else {
                            continue;
                        };

                        let payload = payload.trim();
                        if payload == "[DONE]" {
                            finished = true;
                            break;
                        }

                        let parsed: OpenAiApiStreamResponse = serde_json::from_str(payload)
                            .map_err(|err| ProviderError::transport(err.to_string()))?;

                        if model.is_none() {
                            model = parsed.model.clone();
                        }

                        if let Some(api_usage) = parsed.usage {
                            usage = api_usage.into();
                        }

                        let Some(choice) = parsed.choices.into_iter().next() else {
                            continue;
                        };

                        if let Some(chunk) = choice.delta.content.as_ref().and_then(delta_content_chunk) {
                            match &chunk {
                                OpenAiStreamChunk::TextDelta(text) => content.push_str(text),
                                OpenAiStreamChunk::ContentDelta(parts) => {
                                    for text in parts.iter().filter_map(|part| part.text.as_deref()) {
                                        content.push_str(text);
                                    }
                                }
                                _ => {}
                            }
                            yield chunk;
                        }

                        for delta_call in choice.delta.tool_calls.unwrap_or_default() {
                            let index = delta_call.index.unwrap_or(0);
                            let entry = tool_calls.entry(index).or_insert_with(|| OpenAiToolCall {
                                id: format!("tool_call_{index}"),
                                name: String::new(),
                                arguments: String::new(),
                            });

                            if let Some(id) = delta_call.id {
                                entry.id = id;
                            }

                            if let Some(function) = delta_call.function {
                                if let Some(name) = function.name {
                                    entry.name = name;
                                }

                                if let Some(arguments) = function.arguments {
                                    entry.arguments.push_str(&arguments);
                                }
                            }

                            yield OpenAiStreamChunk::ToolCallDelta(entry.clone());
                        }

                        if choice.finish_reason.is_some() {
                            finish_reason = parse_finish_reason(choice.finish_reason.as_deref());
                        }
                    }

                    if finished {
                        break;
                    }
                }

                let final_message = OpenAiAssistantMessage {
                    content,
                    tool_calls: tool_calls.into_values().collect(),
                };

                yield OpenAiStreamChunk::MessageComplete(final_message.clone());
                yield OpenAiStreamChunk::ResponseComplete(OpenAiResponse {
                    model: model.unwrap_or(model_for_fallback),
                    message: final_message,
                    finish_reason,
                    usage,
                });
            };

            Ok(Box::pin(stream) as OpenAiChunkStream<'a>)
        })
    }
}
