//! Failures reading or writing the thread pointer and transcripts.

use std::error::Error;
use std::fmt::{Display, Formatter};

use lchat::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryErrorKind {
    /// The database could not be opened, locked, or written.
    Storage,
    /// A stored row exists but does not decode into a message.
    CorruptRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryError {
    pub kind: MemoryErrorKind,
    pub message: String,
}

impl MemoryError {
    pub fn new(kind: MemoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Storage, message)
    }

    pub fn corrupt_record(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::CorruptRecord, message)
    }
}

impl Display for MemoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MemoryErrorKind::Storage => write!(f, "conversation storage: {}", self.message),
            MemoryErrorKind::CorruptRecord => {
                write!(f, "corrupt conversation record: {}", self.message)
            }
        }
    }
}

impl Error for MemoryError {}

impl From<MemoryError> for ChatError {
    fn from(value: MemoryError) -> Self {
        ChatError::store(value.to_string())
    }
}
