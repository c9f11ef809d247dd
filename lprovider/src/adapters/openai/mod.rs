//! OpenAI chat-completions adapter; also serves any compatible endpoint.

mod auth;
mod provider;
mod serde_api;
mod transport;
mod types;

pub use provider::{DEFAULT_OPENAI_MODEL, OpenAiProvider};
pub(crate) use provider::{build_openai_request, stream_model_events};
pub use transport::{OPENAI_BASE_URL, OpenAiChunkStream, OpenAiHttpTransport, OpenAiTransport};
pub use types::{
    OpenAiAssistantMessage, OpenAiAuth, OpenAiFinishReason, OpenAiMessage, OpenAiRequest,
    OpenAiResponse, OpenAiRole, OpenAiStreamChunk, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
