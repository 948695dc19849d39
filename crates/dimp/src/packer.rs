//! Message packer: the staged transformation API.
//!
//! Combines the three packers with the transceiver's key management:
//! picking the conversation key before encryption, marking it delivered
//! afterwards, and the outermost wire codec.

use dimp_core::{Identifier, InstantMessage, ReliableMessage, SecureMessage};
use dimp_keyring::{destination, KeyCache, MessageKey};
use dimp_pipeline::{
    InstantMessagePacker, PackError, ReliableMessagePacker, SecureMessagePacker,
};

use crate::directory::IdentityDirectory;
use crate::transceiver::Transceiver;

/// Packs and unpacks messages through the full pipeline.
pub struct MessagePacker<D, C> {
    transceiver: Transceiver<D, C>,
}

impl<D: IdentityDirectory, C: KeyCache> MessagePacker<D, C> {
    pub fn new(transceiver: Transceiver<D, C>) -> Self {
        Self { transceiver }
    }

    pub fn transceiver(&self) -> &Transceiver<D, C> {
        &self.transceiver
    }

    /// Encrypt an instant message, resolving the conversation key from the
    /// cache (generating one on first use).
    ///
    /// Returns `Ok(None)` when a recipient's visa is not yet known; hold
    /// the message and retry after the visa arrives.
    pub fn encrypt_message(
        &self,
        msg: &InstantMessage,
        members: Option<&[Identifier]>,
    ) -> Result<Option<SecureMessage>, PackError> {
        let sender = &msg.envelope.sender;
        let target = destination(&msg.envelope.receiver, msg.envelope.group.as_ref());
        let key = self
            .transceiver
            .cache()
            .cipher_key(sender, target, true)
            .ok_or(PackError::NoCipherKey)?;

        let result =
            InstantMessagePacker::new(&self.transceiver).encrypt_message(msg, &key, members)?;

        // Once wrapped into a message the key counts as delivered; later
        // messages on this vector omit the key field.
        if result.is_some() && !key.is_reused() && !matches!(key, MessageKey::Plain) {
            let mut delivered = key;
            delivered.mark_reused();
            self.transceiver
                .cache()
                .cache_cipher_key(sender, target, delivered);
        }
        Ok(result)
    }

    /// Sign an encrypted message into its wire form.
    pub fn sign_message(&self, msg: &SecureMessage) -> Result<ReliableMessage, PackError> {
        SecureMessagePacker::new(&self.transceiver).sign_message(msg)
    }

    /// Encrypt and sign in one step.
    pub fn pack(
        &self,
        msg: &InstantMessage,
        members: Option<&[Identifier]>,
    ) -> Result<Option<ReliableMessage>, PackError> {
        match self.encrypt_message(msg, members)? {
            Some(secure) => Ok(Some(self.sign_message(&secure)?)),
            None => Ok(None),
        }
    }

    /// Verify a received message; `Ok(None)` drops it.
    pub fn verify_message(
        &self,
        msg: &ReliableMessage,
    ) -> Result<Option<SecureMessage>, PackError> {
        ReliableMessagePacker::new(&self.transceiver).verify_message(msg)
    }

    /// Decrypt a verified message for the given local receiver.
    pub fn decrypt_message(
        &self,
        msg: &SecureMessage,
        receiver: &Identifier,
    ) -> Result<InstantMessage, PackError> {
        SecureMessagePacker::new(&self.transceiver).decrypt_message(msg, receiver)
    }

    /// Verify and decrypt in one step.
    pub fn unpack(
        &self,
        msg: &ReliableMessage,
        receiver: &Identifier,
    ) -> Result<Option<InstantMessage>, PackError> {
        match self.verify_message(msg)? {
            Some(secure) => Ok(Some(self.decrypt_message(&secure, receiver)?)),
            None => Ok(None),
        }
    }

    /// Re-address a group message to a single member.
    pub fn trim(
        &self,
        msg: &SecureMessage,
        member: &Identifier,
    ) -> Result<SecureMessage, PackError> {
        SecureMessagePacker::new(&self.transceiver).trim(msg, member)
    }

    /// Serialize a wire message.
    pub fn serialize_message(&self, msg: &ReliableMessage) -> Vec<u8> {
        serde_json::to_vec(msg).expect("message serialization cannot fail")
    }

    /// Deserialize a wire message.
    pub fn deserialize_message(&self, data: &[u8]) -> Result<ReliableMessage, PackError> {
        serde_json::from_slice(data).map_err(|e| PackError::Codec(e.to_string()))
    }

    /// Attach the sender's identity documents for a first-contact message.
    pub fn attach_sender_documents(&self, msg: &mut ReliableMessage) {
        let sender = msg.envelope.sender.without_terminal();
        if let Some(meta) = self.transceiver.directory().meta(&sender) {
            msg.meta = serde_json::to_value(meta).ok();
        }
        if let Some(visa) = self
            .transceiver
            .directory()
            .documents(&sender)
            .into_iter()
            .next()
        {
            msg.visa = serde_json::to_value(visa).ok();
        }
    }
}
