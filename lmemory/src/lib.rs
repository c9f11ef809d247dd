//! Thread identity and transcript persistence with an lchat adapter.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use lmemory::{InMemoryMemoryBackend, ThreadStore, new_thread_id};
//!
//! let _store = ThreadStore::new(Arc::new(InMemoryMemoryBackend::new()));
//! assert_eq!(new_thread_id().as_str().len(), 32);
//! ```

mod adapter;
mod backend;
mod error;
mod sqlite;
mod thread;

pub mod prelude {
    pub use crate::{
        InMemoryMemoryBackend, MemoryBackend, MemoryConversationStore, MemoryError,
        MemoryErrorKind, SqliteMemoryBackend, ThreadStore, new_thread_id,
    };
    pub use lcommon::ThreadId;
}

pub use adapter::MemoryConversationStore;
pub use backend::{InMemoryMemoryBackend, MemoryBackend};
pub use error::{MemoryError, MemoryErrorKind};
pub use sqlite::SqliteMemoryBackend;
pub use thread::{ThreadStore, new_thread_id};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lchat::{ChatErrorKind, ConversationStore};
    use lcommon::ThreadId;
    use lprovider::{Message, Role};

    use crate::{InMemoryMemoryBackend, MemoryBackend, MemoryConversationStore, MemoryError};

    #[tokio::test]
    async fn conversation_store_adapter_reads_and_writes_transcript() {
        let backend: Arc<dyn MemoryBackend> = Arc::new(InMemoryMemoryBackend::new());
        let store = MemoryConversationStore::new(backend.clone());

        store
            .append_messages(&ThreadId::from("thread-b"), vec![Message::user("hello"), Message::assistant("hi")])
            .await
            .expect("append should work");

        let loaded = store
            .load_messages(&ThreadId::from("thread-b"))
            .await
            .expect("load should work");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].role, Role::User);
        assert_eq!(loaded[1].role, Role::Assistant);
    }

    #[test]
    fn memory_errors_surface_as_store_errors() {
        let error: lchat::ChatError = MemoryError::storage("disk full").into();
        assert_eq!(error.kind, ChatErrorKind::Store);
        assert_eq!(error.message, "conversation storage: disk full");
    }
}
