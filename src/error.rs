//! Error types for LedgerKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unified error type for LedgerKV operations
#[derive(Debug, Error)]
pub enum LedgerError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    // -------------------------------------------------------------------------
    // Transaction Log Errors
    // -------------------------------------------------------------------------
    /// Write or flush to the log medium failed. Terminal for the logger.
    #[error("Durability failure: {0}")]
    Durability(String),

    #[error("Log corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid sequence number: {found} after {previous}")]
    SequenceViolation { previous: u64, found: u64 },

    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Logger Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Logger is not running")]
    NotRunning,

    #[error("Logger has already been started")]
    AlreadyStarted,

    #[error("Append worker has stopped")]
    WriterStopped,

    // -------------------------------------------------------------------------
    // Relational Backend Errors
    // -------------------------------------------------------------------------
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

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

impl LedgerError {
    /// True for errors raised while reading a log back (bad framing, bad
    /// fields, non-monotonic ids, oversized frames)
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            LedgerError::Corruption(_)
                | LedgerError::SequenceViolation { .. }
                | LedgerError::FrameTooLarge { .. }
        )
    }
}
