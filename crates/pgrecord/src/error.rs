//! Error types for pgrecord

use thiserror::Error;

/// Result type alias for pgrecord operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Error types for the data-access layer
#[derive(Debug, Error)]
pub enum RecordError {
    /// No usable connection settings (missing host, unreadable env)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Query execution error reported by the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument to a builder or lifecycle operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl RecordError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
