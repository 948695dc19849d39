//! Reliable packer: the verify transform.
//!
//! ```text
//!   +----------+      +----------+
//!   | sender   |      | sender   |
//!   | receiver |      | receiver |
//!   | time     |  ->  | time     |
//!   |          |      |          |
//!   | data     |      | data     |  1. verify(data, signature, sender.PK)
//!   | key/keys |      | key/keys |
//!   | signature|      +----------+
//!   +----------+
//! ```

use dimp_core::{ReliableMessage, SecureMessage};

use crate::delegate::ReliableMessageDelegate;
use crate::error::PackError;

/// Verifies a reliable message down to a secure message.
pub struct ReliableMessagePacker<'a, D> {
    delegate: &'a D,
}

impl<'a, D: ReliableMessageDelegate> ReliableMessagePacker<'a, D> {
    pub fn new(delegate: &'a D) -> Self {
        Self { delegate }
    }

    /// Verify `data` against `signature` with the sender's key(s).
    ///
    /// A failed verification returns `Ok(None)`: the message is dropped,
    /// never partially trusted. Missing data or signature is a protocol
    /// violation and fatal.
    pub fn verify_message(&self, msg: &ReliableMessage) -> Result<Option<SecureMessage>, PackError> {
        if msg.data.is_empty() {
            return Err(PackError::EmptyData);
        }
        if msg.signature.is_empty() {
            return Err(PackError::MissingSignature);
        }
        if !self
            .delegate
            .verify_data_signature(&msg.data, &msg.signature, msg)
        {
            tracing::debug!(sender = %msg.envelope.sender, "message signature mismatch, dropping");
            return Ok(None);
        }
        Ok(Some(msg.clone().into_secure()))
    }
}
