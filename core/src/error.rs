use thiserror::Error;

/// Boxed error raised by a storage engine.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed statement, detected before any I/O
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// A single result was requested but several rows matched
    #[error("Non-unique result: expected at most one row, found {0}")]
    NonUniqueResult(usize),

    /// No rows returned when exactly one was expected
    #[error("No result found")]
    NoResult,

    /// The storage engine failed to execute a statement
    #[error("Storage execution error: {0}")]
    StorageExecution(#[source] BoxError),

    /// A row value could not be turned into the requested type
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Entity lifecycle violation (identity reassigned, transient reference)
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl QueryError {
    /// Wraps an engine-specific failure.
    pub fn storage(err: impl Into<BoxError>) -> Self {
        Self::StorageExecution(err.into())
    }
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageExecution(Box::new(err))
    }
}

/// Result type for query construction and execution
pub type Result<T> = std::result::Result<T, QueryError>;
