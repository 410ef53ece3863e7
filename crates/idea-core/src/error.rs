//! Error types for idea-core

use thiserror::Error;

/// Main error type for idea-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential not found in environment variable: {0}")]
    CredentialMissing(String),

    #[error("Credential is empty")]
    CredentialEmpty,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to send reply: {0}")]
    Send(String),
}

/// Result type alias for idea-core
pub type Result<T> = std::result::Result<T, Error>;
