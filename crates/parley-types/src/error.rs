use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by the conversation context layer.
///
/// Gateway failures are always transient from the caller's point of view:
/// the conversation keeps working from raw history and the next turn retries.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("summarizer gateway failed: {0}")]
    TransientGateway(String),

    #[error("summary persistence failed: {0}")]
    Persistence(String),

    #[error("invalid conversation state: {0}")]
    InvalidState(String),

    #[error("conversation {0} is busy with another request")]
    Busy(Uuid),
}

impl From<RepositoryError> for ContextError {
    fn from(err: RepositoryError) -> Self {
        ContextError::Persistence(err.to_string())
    }
}

impl From<LlmError> for ContextError {
    fn from(err: LlmError) -> Self {
        ContextError::TransientGateway(err.to_string())
    }
}

/// Errors related to profile, role, and quota operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("daily message limit of {limit} reached")]
    DailyLimitReached { limit: u32 },

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for ProfileError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ProfileError::NotFound,
            other => ProfileError::StorageError(other.to_string()),
        }
    }
}

/// Errors surfaced by the chat and dialog services.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    ChatNotFound,

    #[error("folder not found")]
    FolderNotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for ChatError {
    fn from(err: RepositoryError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
