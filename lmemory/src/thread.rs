//! Identity of the conversation a CLI invocation belongs to.

use std::sync::Arc;

use lcommon::ThreadId;
use uuid::Uuid;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

/// The single durable record of the last used thread.
#[derive(Clone)]
pub struct ThreadStore {
    backend: Arc<dyn MemoryBackend>,
}

impl ThreadStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    /// Returns the stored thread id, or a fresh one that is not persisted
    /// until [`ThreadStore::save`] is called.
    pub async fn get_or_create(&self) -> Result<ThreadId, MemoryError> {
        match self.backend.last_thread_id().await? {
            Some(thread_id) => Ok(thread_id),
            None => Ok(new_thread_id()),
        }
    }

    pub async fn save(&self, thread_id: &ThreadId) -> Result<(), MemoryError> {
        self.backend.replace_last_thread_id(thread_id).await
    }
}

/// 32 lowercase hex characters from a random v4 uuid.
pub fn new_thread_id() -> ThreadId {
    ThreadId::from(Uuid::new_v4().simple().to_string())
}
