use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lcommon::{BoxFuture, ThreadId};
use lprovider::{Message, Role, ToolCall};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

/// SQLite-backed thread and transcript storage.
///
/// `last_conversation` never holds more than one row once a save has
/// completed.
#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS last_conversation (
                id INTEGER PRIMARY KEY,
                thread_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transcript_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tool_calls_json TEXT,
                tool_call_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transcript_thread_id
            ON transcript_messages(thread_id, id);
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    #[cfg(test)]
    fn last_conversation_rows(&self) -> Result<i64, MemoryError> {
        let conn = self.connection()?;
        conn.query_row("SELECT COUNT(*) FROM last_conversation", [], |row| {
            row.get(0)
        })
        .map_err(|error| MemoryError::storage(error.to_string()))
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn last_thread_id<'a>(&'a self) -> BoxFuture<'a, Result<Option<ThreadId>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let thread_id = conn
                .query_row(
                    "SELECT thread_id FROM last_conversation ORDER BY id DESC LIMIT 1",
                    [],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| {
                    MemoryError::storage(format!("failed to read last conversation: {error}"))
                })?;

            Ok(thread_id.map(ThreadId::from))
        })
    }

    fn replace_last_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin transaction: {error}"))
            })?;
            tx.execute("DELETE FROM last_conversation", [])
                .map_err(|error| {
                    MemoryError::storage(format!("failed to clear last conversation: {error}"))
                })?;
            tx.execute(
                "INSERT INTO last_conversation (thread_id) VALUES (?1)",
                params![thread_id.as_str()],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to save last conversation: {error}"))
            })?;
            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit last conversation: {error}"))
            })
        })
    }

    fn load_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT role, content, tool_calls_json, tool_call_id
                    FROM transcript_messages
                    WHERE thread_id = ?1
                    ORDER BY id ASC
                    ",
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to prepare transcript query: {error}"))
                })?;
            let rows = stmt
                .query_map(params![thread_id.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query transcript rows: {error}"))
                })?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, tool_calls_json, tool_call_id) = row.map_err(|error| {
                    MemoryError::storage(format!("failed to read transcript row: {error}"))
                })?;
                let tool_calls = match tool_calls_json {
                    Some(json) => decode_tool_calls(&json)?,
                    None => Vec::new(),
                };
                messages.push(Message {
                    role: role_from_str(&role)?,
                    content,
                    tool_calls,
                    tool_call_id,
                });
            }
            Ok(messages)
        })
    }

    fn append_transcript_messages<'a>(
        &'a self,
        thread_id: &'a ThreadId,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin transaction: {error}"))
            })?;
            for message in messages {
                let tool_calls_json = if message.tool_calls.is_empty() {
                    None
                } else {
                    Some(encode_tool_calls(&message.tool_calls)?)
                };
                tx.execute(
                    "
                    INSERT INTO transcript_messages
                        (thread_id, role, content, tool_calls_json, tool_call_id)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                    params![
                        thread_id.as_str(),
                        message.role.as_str(),
                        message.content,
                        tool_calls_json,
                        message.tool_call_id,
                    ],
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to append transcript message: {error}"))
                })?;
            }
            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit transcript messages: {error}"))
            })
        })
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToolCall {
    id: String,
    name: String,
    arguments: String,
}

fn encode_tool_calls(calls: &[ToolCall]) -> Result<String, MemoryError> {
    let stored = calls
        .iter()
        .map(|call| StoredToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        })
        .collect::<Vec<_>>();
    serde_json::to_string(&stored)
        .map_err(|error| MemoryError::storage(format!("failed to encode tool calls: {error}")))
}

fn decode_tool_calls(json: &str) -> Result<Vec<ToolCall>, MemoryError> {
    let stored: Vec<StoredToolCall> = serde_json::from_str(json)
        .map_err(|error| MemoryError::corrupt_record(format!("failed to decode tool calls: {error}")))?;
    Ok(stored
        .into_iter()
        .map(|call| ToolCall::new(call.id, call.name, call.arguments))
        .collect())
}

fn role_from_str(value: &str) -> Result<Role, MemoryError> {
    Role::parse(value).ok_or_else(|| {
        MemoryError::corrupt_record(format!("unknown transcript role value '{value}'"))
    })
}
