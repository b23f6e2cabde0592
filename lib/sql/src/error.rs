use thiserror::Error;

/// Errors produced by a [`crate::SQLStore`] backend.
#[derive(Debug, Error)]
pub enum SQLError {
    #[error("connection: {0}")]
    Connection(String),

    #[error("query: {0}")]
    Query(String),

    #[error("execution: {0}")]
    Execution(String),
}
