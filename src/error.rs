//! Error types for DealerDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using DealerError
pub type Result<T> = std::result::Result<T, DealerError>;

/// Unified error type for DealerDB operations
#[derive(Debug, Error)]
pub enum DealerError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("Ordinal {ordinal} out of range ({rows} rows)")]
    OutOfRange { ordinal: u64, rows: u64 },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record too large: {len} bytes (slot width {max})")]
    RecordTooLarge { len: usize, max: usize },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Sale already deleted: {0}")]
    AlreadyDeleted(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DealerError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        DealerError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// True if this error means the key simply isn't there
    pub fn is_not_found(&self) -> bool {
        matches!(self, DealerError::NotFound { .. })
    }
}
