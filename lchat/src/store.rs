//! Where transcripts are checkpointed between runs.

use std::collections::HashMap;
use std::sync::Mutex;

use lcommon::{BoxFuture, ThreadId};
use lprovider::Message;

use crate::ChatError;

pub type ChatFuture<'a, T> = BoxFuture<'a, T>;

/// Transcript checkpoints keyed by thread id. Appends happen once per
/// successful run, so a failed run leaves the stored transcript untouched.
pub trait ConversationStore: Send + Sync {
    fn load_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> ChatFuture<'a, Result<Vec<Message>, ChatError>>;

    fn append_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    threads: Mutex<HashMap<ThreadId, Vec<Message>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn load_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> ChatFuture<'a, Result<Vec<Message>, ChatError>> {
        Box::pin(async move {
            let threads = self
                .threads
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            Ok(threads.get(thread_id).cloned().unwrap_or_default())
        })
    }

    fn append_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut threads = self
                .threads
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            threads
                .entry(thread_id.clone())
                .or_default()
                .extend(messages);

            Ok(())
        })
    }
}
