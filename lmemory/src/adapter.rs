//! Lets the agent executor checkpoint transcripts into a [`MemoryBackend`].

use std::sync::Arc;

use lchat::{ChatError, ChatFuture, ConversationStore};
use lcommon::ThreadId;
use lprovider::Message;

use crate::backend::MemoryBackend;

#[derive(Clone)]
pub struct MemoryConversationStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryConversationStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl ConversationStore for MemoryConversationStore {
    fn load_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> ChatFuture<'a, Result<Vec<Message>, ChatError>> {
        Box::pin(async move { Ok(self.backend.load_transcript_messages(thread_id).await?) })
    }

    fn append_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            Ok(self
                .backend
                .append_transcript_messages(thread_id, messages)
                .await?)
        })
    }
}
