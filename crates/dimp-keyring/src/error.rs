//! Error types for the keyring.

use thiserror::Error;

/// Errors that can occur handling key material and bundles.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Key material could not be parsed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Serialized key named an algorithm this build does not carry.
    #[error("unknown key algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Bundle wire keys must be built from a terminal-less identity; the
    /// terminal comes from the bundle's own entries.
    #[error("bundle identity must not carry a terminal: {0}")]
    IdentifierHasTerminal(String),

    /// Two wire entries decoded onto the same terminal.
    #[error("duplicate bundle entry for terminal '{0}'")]
    DuplicateTerminal(String),
}

/// Result type for keyring operations.
pub type Result<T> = std::result::Result<T, KeyringError>;
