//! Cryptographic primitives for the keyring.
//!
//! Provides the default implementations behind the core capability traits:
//! X25519 sealed-box key wrapping and a ChaCha20-Poly1305 message key.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dimp_core::crypto::{DecryptKey, EncryptKey, SymmetricCipher};

use crate::error::KeyringError;

/// Sealed box layout: ephemeral public key, then nonce, then ciphertext.
const SEAL_OVERHEAD: usize = 32 + NONCE_LEN;
const NONCE_LEN: usize = 12;

/// An X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Pub({})", &self.to_hex()[..16])
    }
}

impl Serialize for X25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for X25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Seal a small secret for the holder of this public key.
///
/// An ephemeral keypair is generated per call, so sealing the same
/// plaintext twice produces unrelated ciphertexts.
impl EncryptKey for X25519PublicKey {
    fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        let ephemeral = EphemeralSecret::random_from_rng(rand::thread_rng());
        let ephemeral_public = X25519PublicKey::from(PublicKey::from(&ephemeral));

        let shared = SharedKey(*ephemeral.diffie_hellman(&self.to_dalek()).as_bytes());
        let wrap_key = shared.derive_wrap_key(self.as_bytes());

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key.0)
            .expect("wrap key is always 32 bytes");
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .expect("sealing cannot fail with a valid key");

        let mut out = Vec::with_capacity(SEAL_OVERHEAD + ciphertext.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        out
    }
}

/// An X25519 static secret key.
///
/// Unlike Ed25519, X25519 keys are only for key agreement, not signing.
#[derive(Clone)]
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }
}

impl DecryptKey for X25519StaticSecret {
    fn open(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < SEAL_OVERHEAD {
            return None;
        }
        let (header, sealed) = ciphertext.split_at(SEAL_OVERHEAD);
        let ephemeral_public: [u8; 32] = header[..32].try_into().ok()?;
        let nonce = &header[32..];

        let shared = SharedKey(
            *self
                .0
                .diffie_hellman(&PublicKey::from(ephemeral_public))
                .as_bytes(),
        );
        let wrap_key = shared.derive_wrap_key(self.public_key().as_bytes());

        let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key.0).ok()?;
        cipher.decrypt(Nonce::from_slice(nonce), sealed).ok()
    }
}

impl fmt::Debug for X25519StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Secret({:?})", self.public_key())
    }
}

/// A shared secret derived from X25519 key agreement.
struct SharedKey([u8; 32]);

impl SharedKey {
    /// Derive the key-wrap key with domain separation. The recipient's
    /// public key is mixed in as context so a sealed box only opens for
    /// the key it was addressed to.
    fn derive_wrap_key(&self, context: &[u8]) -> SharedKey {
        let mut hasher = blake3::Hasher::new_derive_key("dimp-keyring-v1-wrap");
        hasher.update(&self.0);
        hasher.update(context);
        SharedKey(*hasher.finalize().as_bytes())
    }
}

/// The symmetric message key shared between sender and receiver.
///
/// `Plain` is the compatibility cipher used for broadcast messages: it
/// frames content without protecting it, so broadcast `data` stays readable
/// text on the wire.
#[derive(Clone)]
pub enum MessageKey {
    /// Identity cipher for broadcast framing.
    Plain,

    /// ChaCha20-Poly1305 with a 256-bit key. Ciphertext is nonce-prefixed.
    ChaCha20Poly1305 {
        key: [u8; 32],
        /// Set once this key has been delivered to the receiver, allowing
        /// later messages to omit the wrapped key field. Local bookkeeping,
        /// never serialized.
        reused: bool,
    },
}

impl MessageKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::ChaCha20Poly1305 { key, reused: false }
    }

    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self::ChaCha20Poly1305 { key, reused: false }
    }

    /// Whether the receiver is expected to hold this key already.
    pub fn is_reused(&self) -> bool {
        matches!(self, Self::ChaCha20Poly1305 { reused: true, .. })
    }

    /// Mark this key as delivered.
    pub fn mark_reused(&mut self) {
        if let Self::ChaCha20Poly1305 { reused, .. } = self {
            *reused = true;
        }
    }
}

impl SymmetricCipher for MessageKey {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        match self {
            Self::Plain => plaintext.to_vec(),
            Self::ChaCha20Poly1305 { key, .. } => {
                let mut nonce = [0u8; NONCE_LEN];
                rand::thread_rng().fill_bytes(&mut nonce);
                let cipher = ChaCha20Poly1305::new_from_slice(key)
                    .expect("message key is always 32 bytes");
                let ciphertext = cipher
                    .encrypt(Nonce::from_slice(&nonce), plaintext)
                    .expect("encryption cannot fail with a valid key");
                let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
                out.extend_from_slice(&nonce);
                out.extend_from_slice(&ciphertext);
                out
            }
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::Plain => Some(ciphertext.to_vec()),
            Self::ChaCha20Poly1305 { key, .. } => {
                if ciphertext.len() < NONCE_LEN {
                    return None;
                }
                let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
                let cipher = ChaCha20Poly1305::new_from_slice(key).ok()?;
                cipher.decrypt(Nonce::from_slice(nonce), sealed).ok()
            }
        }
    }
}

// The delivery marker is bookkeeping, not key material.
impl PartialEq for MessageKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain, Self::Plain) => true,
            (Self::ChaCha20Poly1305 { key: a, .. }, Self::ChaCha20Poly1305 { key: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl Eq for MessageKey {}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "MessageKey(plain)"),
            Self::ChaCha20Poly1305 { reused, .. } => {
                write!(f, "MessageKey(chacha20poly1305, reused={reused})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Serialized key form: {"algorithm": ..., "data": base64}
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct MessageKeyWire {
    algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl Serialize for MessageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Plain => MessageKeyWire {
                algorithm: "plain".into(),
                data: None,
            },
            Self::ChaCha20Poly1305 { key, .. } => MessageKeyWire {
                algorithm: "chacha20poly1305".into(),
                data: Some(BASE64.encode(key)),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = MessageKeyWire::deserialize(deserializer)?;
        MessageKey::try_from(wire).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<MessageKeyWire> for MessageKey {
    type Error = KeyringError;

    fn try_from(wire: MessageKeyWire) -> Result<Self, Self::Error> {
        match wire.algorithm.as_str() {
            "plain" => Ok(Self::Plain),
            "chacha20poly1305" => {
                let data = wire
                    .data
                    .ok_or_else(|| KeyringError::InvalidKey("missing key data".into()))?;
                let bytes = BASE64
                    .decode(&data)
                    .map_err(|e| KeyringError::InvalidKey(e.to_string()))?;
                let key: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| KeyringError::InvalidKey("key must be 32 bytes".into()))?;
                Ok(Self::ChaCha20Poly1305 { key, reused: false })
            }
            other => Err(KeyringError::UnknownAlgorithm(other.into())),
        }
    }
}
