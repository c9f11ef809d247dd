//! Memory backend trait and in-memory backend implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use lcommon::{BoxFuture, ThreadId};
use lprovider::Message;

use crate::error::MemoryError;

/// Storage for the last used thread id and per-thread transcripts.
pub trait MemoryBackend: Send + Sync {
    fn last_thread_id<'a>(&'a self) -> BoxFuture<'a, Result<Option<ThreadId>, MemoryError>>;

    /// Leaves `thread_id` as the only stored last thread.
    fn replace_last_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn load_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>>;

    fn append_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    last_thread_id: Option<ThreadId>,
    transcripts: HashMap<ThreadId, Vec<Message>>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, MemoryError> {
        self.state
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn last_thread_id<'a>(&'a self) -> BoxFuture<'a, Result<Option<ThreadId>, MemoryError>> {
        Box::pin(async move { Ok(self.lock()?.last_thread_id.clone()) })
    }

    fn replace_last_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.lock()?.last_thread_id = Some(thread_id.clone());
            Ok(())
        })
    }

    fn load_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move {
            Ok(self
                .lock()?
                .transcripts
                .get(thread_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn append_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.lock()?
                .transcripts
                .entry(thread_id.clone())
                .or_default()
                .extend(messages);
            Ok(())
        })
    }
}
