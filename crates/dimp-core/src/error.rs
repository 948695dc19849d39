//! Error types for the DIMP core.

use thiserror::Error;

/// Core errors that can occur while parsing or encoding message values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid base64 field '{field}': {reason}")]
    InvalidBase64 { field: String, reason: String },

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
