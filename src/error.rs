// Error types for the task store

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, TodoError>;

/// Errors surfaced by store, repository and backend operations
#[derive(Debug, Error)]
pub enum TodoError {
    /// Input rejected before any state was touched
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation referenced an id that is not in the collection
    #[error("task not found: {0}")]
    NotFound(String),

    /// Id prefix matched more than one task
    #[error("id prefix '{prefix}' matches {count} tasks")]
    AmbiguousId { prefix: String, count: usize },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failures reading from or writing to the key-value backend
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite backend error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("value for key '{key}' is {size} bytes, quota is {limit} bytes")]
    QuotaExceeded { key: String, size: usize, limit: usize },
}

/// A persisted blob that is present but not a valid task collection
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed task collection: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate task id: {0}")]
    DuplicateId(String),

    #[error("task {0} has an empty title")]
    EmptyTitle(String),

    #[error("task {0} has updated_at earlier than created_at")]
    TimestampOrder(String),
}

/// A text value that does not name a known status, status filter or sort mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}' (expected one of: {expected})")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl TodoError {
    /// Build a validation error from a message
    pub fn validation(message: impl Into<String>) -> Self {
        TodoError::Validation(message.into())
    }
}
