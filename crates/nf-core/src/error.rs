//! Error types for NoteForge

use thiserror::Error;

/// Core error type
///
/// Interactive editing never fails: out-of-range input is clamped and stale
/// handles are ignored. Errors only surface at the boundaries where data
/// enters the editor (configuration files, clipboard blobs).
#[derive(Error, Debug)]
pub enum NfError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type NfResult<T> = Result<T, NfError>;
