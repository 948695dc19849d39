//! Error types for the message pipeline.
//!
//! Only fatal conditions are errors: data corruption, stale keys, protocol
//! violations. Expected absence (a receiver's visa not yet known, a dropped
//! signature) is `Ok(None)` at the packer surface, never an error.

use thiserror::Error;

use dimp_keyring::KeyringError;

/// Fatal pipeline failures. Each aborts the transformation of one message
/// without affecting any other.
#[derive(Debug, Error)]
pub enum PackError {
    /// `data` must never be empty at sign or decrypt time.
    #[error("message data is empty")]
    EmptyData,

    /// A reliable message arrived without its signature.
    #[error("message signature is missing")]
    MissingSignature,

    /// A wrapped key was present but did not open: stale local key or
    /// corrupted data. The sender should refresh this receiver's visa.
    #[error("wrapped message key present but undecryptable")]
    UndecryptableKey,

    /// No wrapped key and no cached key to fall back on.
    #[error("no usable message key")]
    NoCipherKey,

    /// The message data did not decrypt under the resolved key.
    #[error("failed to decrypt message data")]
    DecryptFailed,

    /// Decrypted bytes did not parse as content.
    #[error("message content corrupted or unsupported")]
    ContentCorrupted,

    /// The sender's signing key was unavailable.
    #[error("signing key unavailable for sender")]
    SignerMissing,

    /// Tried to trim a message that is not group-addressed.
    #[error("not a group message")]
    NotGroupMessage,

    /// Key bundle violation (terminal-qualified identity, duplicate entry).
    #[error(transparent)]
    Keyring(#[from] KeyringError),

    /// Wire codec failure.
    #[error("codec error: {0}")]
    Codec(String),
}
