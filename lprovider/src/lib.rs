//! Provider abstraction for chat-completion style model backends.
//!
//! ```rust
//! use lprovider::{Message, ModelRequest, Role};
//!
//! let request = ModelRequest::new("gpt-4o", vec![Message::new(Role::User, "hi")])
//!     .with_temperature(0.0)
//!     .enable_streaming();
//!
//! assert!(request.validate().is_ok());
//! assert!(request.options.stream);
//! ```

pub mod adapters;
mod credentials;
mod error;
mod model;
mod provider;
mod resilience;
mod stream;

pub mod prelude {
    pub use crate::{
        BoxedEventStream, ContentPart, DeltaContent, Message, ModelProvider, ModelRequest,
        ModelResponse, NoopOperationHooks, OutputItem, ProviderError, ProviderErrorKind,
        ProviderFuture, ProviderId, ProviderOperationHooks, RetryPolicy, Role, StopReason,
        StreamEvent, TokenUsage, ToolCall, ToolDefinition, execute_with_retry,
    };
    pub use lcommon::BoxFuture;
}

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    Message, ModelRequest, ModelResponse, OutputItem, ProviderId, Role, StopReason, TokenUsage,
    ToolCall, ToolDefinition,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use stream::{
    BoxedEventStream, ContentPart, DeltaContent, ModelEventStream, StreamEvent, VecEventStream,
};
