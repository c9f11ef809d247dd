use std::sync::Arc;

use lmemory::prelude::*;
use lprovider::Message;
use tempfile::TempDir;

#[tokio::test]
async fn thread_survives_reopening_the_database() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("conversations.db");

    let thread_id = {
        let store = ThreadStore::new(Arc::new(SqliteMemoryBackend::new(&path).expect("open sqlite")));
        let thread_id = store.get_or_create().await.expect("mint");
        store.save(&thread_id).await.expect("save");
        thread_id
    };

    let reopened = ThreadStore::new(Arc::new(SqliteMemoryBackend::new(&path).expect("reopen")));
    assert_eq!(reopened.get_or_create().await.expect("read"), thread_id);
}

#[tokio::test]
async fn continuation_resumes_the_saved_transcript() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("conversations.db");
    let thread_id = ThreadId::from("feedfacefeedfacefeedfacefeedface");

    {
        let backend: Arc<dyn MemoryBackend> =
            Arc::new(SqliteMemoryBackend::new(&path).expect("open"));
        let store = MemoryConversationStore::new(backend.clone());
        lchat::ConversationStore::append_messages(
            &store,
            &thread_id,
            vec![Message::user("summarize"), Message::assistant("summary")],
        )
        .await
        .expect("append");
        ThreadStore::new(backend).save(&thread_id).await.expect("save");
    }

    let backend: Arc<dyn MemoryBackend> = Arc::new(SqliteMemoryBackend::new(&path).expect("reopen"));
    let resumed = ThreadStore::new(backend.clone())
        .get_or_create()
        .await
        .expect("thread");
    let store = MemoryConversationStore::new(backend);
    let messages = lchat::ConversationStore::load_messages(&store, &resumed)
        .await
        .expect("load");

    assert_eq!(resumed, thread_id);
    assert_eq!(messages, vec![Message::user("summarize"), Message::assistant("summary")]);
}
