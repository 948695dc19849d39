//! Message transceiver.
//!
//! Implements the pipeline's delegate seam over an identity directory and a
//! key cache: JSON codecs for content and keys, visa-driven key wrapping,
//! and the omission rules for broadcast and reused keys. The transceiver
//! holds no message state; collaborators carry their own synchronization.

use dimp_core::{
    Content, Identifier, InstantMessage, ReliableMessage, SecureMessage, SymmetricCipher,
    VerifyKey,
};
use dimp_keyring::{destination, EncryptedBundle, KeyCache, MessageKey, VisaAgent};
use dimp_pipeline::{InstantMessageDelegate, ReliableMessageDelegate, SecureMessageDelegate};

use dimp_core::crypto::DecryptKey;

use crate::directory::IdentityDirectory;

/// The concrete serialization and crypto choices behind the packers.
pub struct Transceiver<D, C> {
    directory: D,
    cache: C,
    agent: VisaAgent,
}

impl<D: IdentityDirectory, C: KeyCache> Transceiver<D, C> {
    pub fn new(directory: D, cache: C) -> Self {
        Self {
            directory,
            cache,
            agent: VisaAgent,
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<D: IdentityDirectory, C: KeyCache> InstantMessageDelegate for Transceiver<D, C> {
    type Key = MessageKey;

    fn serialize_content(
        &self,
        content: &Content,
        _key: &MessageKey,
        _msg: &InstantMessage,
    ) -> Vec<u8> {
        serde_json::to_vec(content).expect("content serialization cannot fail")
    }

    fn encrypt_content(&self, data: &[u8], key: &MessageKey, _msg: &InstantMessage) -> Vec<u8> {
        key.encrypt(data)
    }

    fn serialize_key(&self, key: &MessageKey, msg: &InstantMessage) -> Option<Vec<u8>> {
        if msg.envelope.is_broadcast() {
            // broadcast message has no key
            return None;
        }
        if key.is_reused() {
            // already delivered; the receiver holds it in its cache
            return None;
        }
        Some(serde_json::to_vec(key).expect("key serialization cannot fail"))
    }

    fn encrypt_key(
        &self,
        data: &[u8],
        receiver: &Identifier,
        _msg: &InstantMessage,
    ) -> Option<EncryptedBundle> {
        let target = receiver.without_terminal();
        let Some(meta) = self.directory.meta(&target) else {
            tracing::debug!(receiver = %target, "meta not known, cannot wrap message key");
            return None;
        };
        let documents = self.directory.documents(&target);
        Some(self.agent.encrypt_bundle(data, &meta, &documents))
    }
}

impl<D: IdentityDirectory, C: KeyCache> SecureMessageDelegate for Transceiver<D, C> {
    type Key = MessageKey;

    fn decrypt_key(
        &self,
        key: &[u8],
        receiver: &Identifier,
        _msg: &SecureMessage,
    ) -> Option<Vec<u8>> {
        let user = self.directory.local_user(receiver)?;
        user.exchange_secret.open(key)
    }

    fn deserialize_key(&self, key: Option<&[u8]>, msg: &SecureMessage) -> Option<MessageKey> {
        let sender = &msg.envelope.sender;
        let target = destination(&msg.envelope.receiver, msg.envelope.group.as_ref());
        match key {
            Some(bytes) => {
                let parsed: MessageKey = serde_json::from_slice(bytes).ok()?;
                // remember it so the sender may omit the key next time
                self.cache.cache_cipher_key(sender, target, parsed.clone());
                Some(parsed)
            }
            // omitted key: reused (from cache) or broadcast (plain)
            None => self.cache.cipher_key(sender, target, false),
        }
    }

    fn decrypt_content(
        &self,
        data: &[u8],
        key: &MessageKey,
        _msg: &SecureMessage,
    ) -> Option<Vec<u8>> {
        key.decrypt(data)
    }

    fn deserialize_content(
        &self,
        data: &[u8],
        _key: &MessageKey,
        _msg: &SecureMessage,
    ) -> Option<Content> {
        serde_json::from_slice(data).ok()
    }

    fn sign_data(&self, data: &[u8], msg: &SecureMessage) -> Option<Vec<u8>> {
        let user = self.directory.local_user(&msg.envelope.sender)?;
        Some(user.sign_keypair.sign(data).as_bytes().to_vec())
    }
}

impl<D: IdentityDirectory, C: KeyCache> ReliableMessageDelegate for Transceiver<D, C> {
    fn verify_data_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        msg: &ReliableMessage,
    ) -> bool {
        let sender = msg.envelope.sender.without_terminal();
        let Some(meta) = self.directory.meta(&sender) else {
            tracing::debug!(sender = %sender, "meta not known, cannot verify signature");
            return false;
        };
        let documents = self.directory.documents(&sender);
        // the sender may have signed with a device key or its identity key
        self.agent
            .verify_keys(&meta, &documents)
            .iter()
            .any(|key| key.verify(data, signature))
    }
}
