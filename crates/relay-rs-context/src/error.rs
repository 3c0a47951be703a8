//! Error types for context store operations.

/// Errors raised inside context stores and helpers.
///
/// The four store operations never return these; they are logged and folded
/// into the success flag or absent result. Construction of a store does
/// return them.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Call identifier was empty.
    #[error("invalid call id: {0:?}")]
    InvalidCallId(String),
    /// Background task failed to run to completion.
    #[error("task error: {0}")]
    Task(String),
}
