//! Errors surfaced by the `llm` binary and their process exit codes.

use lchat::{ChatError, ChatErrorKind};
use lmemory::MemoryError;
use lprovider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid configuration file, provider, or credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Thread or transcript storage could not be opened or written.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Exit codes follow sysexits.h where one fits.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 78,  // EX_CONFIG
            CliError::Storage(_) => 73, // EX_CANTCREAT
            CliError::Io(_) => 74,      // EX_IOERR
            CliError::Provider(_) | CliError::Agent(_) => 1,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err.to_string())
    }
}

impl From<MemoryError> for CliError {
    fn from(err: MemoryError) -> Self {
        CliError::Storage(err.message)
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        CliError::Provider(err.to_string())
    }
}

impl From<ChatError> for CliError {
    fn from(err: ChatError) -> Self {
        match err.kind {
            ChatErrorKind::Store => CliError::Storage(err.message),
            ChatErrorKind::Provider => CliError::Provider(err.message),
            ChatErrorKind::InvalidRequest => CliError::Agent(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_sysexits() {
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(CliError::Storage("x".into()).exit_code(), 73);
        assert_eq!(CliError::Io("x".into()).exit_code(), 74);
        assert_eq!(CliError::Agent("x".into()).exit_code(), 1);
    }

    #[test]
    fn store_failures_during_a_run_are_storage_errors() {
        let error = CliError::from(ChatError::store("database is locked"));
        assert!(matches!(error, CliError::Storage(message) if message == "database is locked"));
    }
}
