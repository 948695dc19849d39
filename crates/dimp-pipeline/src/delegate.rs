//! Delegate seam between the packers and concrete serialization/crypto.
//!
//! The packers define the order of operations; everything that touches a
//! codec or a key goes through these traits. A packer borrows its delegate
//! for the duration of one call and never stores an owning handle.
//!
//! Expected absence is signalled by the `Option` returns: a missing visa,
//! an intentionally omitted key, an unverifiable signature. The packers
//! decide which absences suspend the message and which are fatal.

use dimp_core::{
    Content, Identifier, InstantMessage, ReliableMessage, SecureMessage, SymmetricCipher,
};
use dimp_keyring::EncryptedBundle;

/// Send-side seam: InstantMessage → SecureMessage.
pub trait InstantMessageDelegate {
    type Key: SymmetricCipher;

    /// Serialize content for encryption.
    fn serialize_content(&self, content: &Content, key: &Self::Key, msg: &InstantMessage)
        -> Vec<u8>;

    /// Encrypt serialized content with the message key.
    fn encrypt_content(&self, data: &[u8], key: &Self::Key, msg: &InstantMessage) -> Vec<u8>;

    /// Serialize the message key for wrapping.
    ///
    /// Returns `None` to omit the key field entirely: broadcast messages
    /// carry no key, and a reused key is already in the receiver's cache.
    fn serialize_key(&self, key: &Self::Key, msg: &InstantMessage) -> Option<Vec<u8>>;

    /// Wrap serialized key data for one receiver, once per device terminal.
    ///
    /// Returns `None` (or an empty bundle) when the receiver's public key
    /// cannot be resolved yet; the caller holds the message and retries
    /// when the visa arrives.
    fn encrypt_key(
        &self,
        data: &[u8],
        receiver: &Identifier,
        msg: &InstantMessage,
    ) -> Option<EncryptedBundle>;
}

/// Receive-side seam: SecureMessage → InstantMessage, plus signing.
pub trait SecureMessageDelegate {
    type Key: SymmetricCipher;

    /// Unwrap the message key with the receiver's private key. `None` means
    /// the wrap did not open; the packer treats that as fatal.
    fn decrypt_key(&self, key: &[u8], receiver: &Identifier, msg: &SecureMessage)
        -> Option<Vec<u8>>;

    /// Deserialize key data into a usable key. With `None` input the key
    /// was omitted and must be recovered from the reuse cache.
    fn deserialize_key(&self, key: Option<&[u8]>, msg: &SecureMessage) -> Option<Self::Key>;

    /// Decrypt message data with the resolved key.
    fn decrypt_content(&self, data: &[u8], key: &Self::Key, msg: &SecureMessage)
        -> Option<Vec<u8>>;

    /// Deserialize decrypted bytes into content.
    fn deserialize_content(&self, data: &[u8], key: &Self::Key, msg: &SecureMessage)
        -> Option<Content>;

    /// Sign message data with the sender's private key.
    fn sign_data(&self, data: &[u8], msg: &SecureMessage) -> Option<Vec<u8>>;
}

/// Verification seam: ReliableMessage → SecureMessage.
pub trait ReliableMessageDelegate {
    /// Verify the signature over message data with the sender's public
    /// key(s).
    fn verify_data_signature(&self, data: &[u8], signature: &[u8], msg: &ReliableMessage)
        -> bool;
}
