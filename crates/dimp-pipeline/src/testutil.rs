//! Shared mock delegate for packer unit tests.

use std::collections::HashMap;

use dimp_core::crypto::{DecryptKey, EncryptKey};
use dimp_core::{
    Content, Ed25519PublicKey, Envelope, Identifier, InstantMessage, ReliableMessage,
    SecureMessage, SignKeypair, SymmetricCipher,
};
use dimp_keyring::{EncryptedBundle, MessageKey, X25519StaticSecret, ANY_TERMINAL};

use crate::delegate::{InstantMessageDelegate, ReliableMessageDelegate, SecureMessageDelegate};

pub fn ids(s: &str) -> Identifier {
    s.parse().unwrap()
}

/// Delegate over an in-memory recipient table: each known recipient holds
/// one X25519 secret per terminal, and one signer covers all senders.
pub struct MockDelegate {
    recipients: HashMap<Identifier, Vec<(String, X25519StaticSecret)>>,
    signer: SignKeypair,
    cached: Option<MessageKey>,
}

impl MockDelegate {
    pub fn with_recipients(names: &[&str]) -> Self {
        let mut recipients = HashMap::new();
        for name in names {
            recipients.insert(
                ids(name),
                vec![(ANY_TERMINAL.to_string(), X25519StaticSecret::generate())],
            );
        }
        Self {
            recipients,
            signer: SignKeypair::generate(),
            cached: None,
        }
    }

    pub fn add_recipient_terminals(&mut self, name: &str, terminals: &[&str]) {
        let entry = self.recipients.entry(ids(name)).or_default();
        for terminal in terminals {
            entry.push((terminal.to_string(), X25519StaticSecret::generate()));
        }
    }

    pub fn cache_key(&mut self, key: MessageKey) {
        self.cached = Some(key);
    }

    pub fn signer_public_key(&self) -> Ed25519PublicKey {
        self.signer.public_key()
    }

    pub fn instant(
        &self,
        sender: Identifier,
        receiver: Identifier,
        content: Content,
    ) -> InstantMessage {
        InstantMessage::new(Envelope::new(sender, receiver, 1736870400000), content)
    }

    pub fn group_instant(
        &self,
        sender: Identifier,
        group: Identifier,
        content: Content,
    ) -> InstantMessage {
        InstantMessage::new(
            Envelope::with_group(sender, group.clone(), 1736870400000, group),
            content,
        )
    }
}

impl InstantMessageDelegate for MockDelegate {
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
        if msg.envelope.is_broadcast() || key.is_reused() {
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
        let secrets = self.recipients.get(receiver)?;
        let mut bundle = EncryptedBundle::new();
        for (terminal, secret) in secrets {
            bundle.put(terminal, secret.public_key().seal(data));
        }
        Some(bundle)
    }
}

impl SecureMessageDelegate for MockDelegate {
    type Key = MessageKey;

    fn decrypt_key(
        &self,
        key: &[u8],
        receiver: &Identifier,
        _msg: &SecureMessage,
    ) -> Option<Vec<u8>> {
        let secrets = self.recipients.get(receiver)?;
        secrets.iter().find_map(|(_, secret)| secret.open(key))
    }

    fn deserialize_key(&self, key: Option<&[u8]>, msg: &SecureMessage) -> Option<MessageKey> {
        match key {
            Some(bytes) => serde_json::from_slice(bytes).ok(),
            None if msg.envelope.is_broadcast() => Some(MessageKey::Plain),
            None => self.cached.clone(),
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

    fn sign_data(&self, data: &[u8], _msg: &SecureMessage) -> Option<Vec<u8>> {
        Some(self.signer.sign(data).as_bytes().to_vec())
    }
}

impl ReliableMessageDelegate for MockDelegate {
    fn verify_data_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        _msg: &ReliableMessage,
    ) -> bool {
        use dimp_core::VerifyKey;
        self.signer.public_key().verify(data, signature)
    }
}
