//! Error types for the LBRY SPV header store.

use std::io;
use thiserror::Error;

use crate::types::BlockHash;

/// Main error type for the header store.
#[derive(Debug, Error)]
pub enum SpvError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Parse-related errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unknown chain name: {0}")]
    UnknownChain(String),
}

/// Logging-related errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] io::Error),

    #[error("Subscriber initialization failed: {0}")]
    SubscriberInit(String),

    #[error("Log rotation failed: {0}")]
    RotationFailed(String),
}

/// Storage-related errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The raw input or the backing file does not divide into whole
    /// 112-byte header records.
    #[error("Invalid header format: {0}")]
    InvalidFormat(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Validation-related errors.
///
/// Every variant is detected before any byte reaches the store, so a failed
/// `connect` leaves the header file untouched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("header {height} does not connect: expected previous hash {expected}, found {actual}")]
    InvalidChainLinkage {
        height: u32,
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error("no stored predecessor for header at height {height}")]
    MissingPredecessor { height: u32 },

    #[error("difficulty mismatch at height {height}: expected bits {expected:#010x}, found {actual:#010x}")]
    InvalidDifficulty {
        height: u32,
        expected: u32,
        actual: u32,
    },

    #[error("malformed compact bits {bits:#010x}: {reason}")]
    InvalidCompactBits { bits: u32, reason: String },

    #[error("insufficient proof of work at height {height}")]
    InsufficientProofOfWork { height: u32 },
}

/// Type alias for Result with SpvError.
pub type Result<T> = std::result::Result<T, SpvError>;

/// Type alias for storage operation results.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Type alias for validation operation results.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Type alias for logging operation results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
