//! Secure packer: the decrypt and sign transforms.
//!
//! ```text
//!   decrypt                               sign
//!   +----------+      +----------+        +----------+      +----------+
//!   | sender   |      | sender   |        | sender   |      | sender   |
//!   | receiver |      | receiver |        | receiver |      | receiver |
//!   | time     |  ->  | time     |        | time     |  ->  | time     |
//!   |          |      |          |        |          |      |          |
//!   | data     |      | content  |        | data     |      | data     |
//!   | key/keys |      +----------+        | key/keys |      | key/keys |
//!   +----------+                          +----------+      | signature|
//!                                                           +----------+
//! ```

use bytes::Bytes;

use dimp_core::{Identifier, InstantMessage, ReliableMessage, SecureMessage};

use crate::delegate::SecureMessageDelegate;
use crate::error::PackError;

/// Decrypts a secure message back to an instant message, and signs one into
/// a reliable message.
pub struct SecureMessagePacker<'a, D> {
    delegate: &'a D,
}

impl<'a, D: SecureMessageDelegate> SecureMessagePacker<'a, D> {
    pub fn new(delegate: &'a D) -> Self {
        Self { delegate }
    }

    /// Decrypt a message for the given local receiver.
    ///
    /// Every failure here is fatal: a wrapped key that does not open means
    /// a stale local key or corrupted data (the sender should refresh this
    /// receiver's visa), and no stage may silently fall through to a
    /// partial result.
    pub fn decrypt_message(
        &self,
        msg: &SecureMessage,
        receiver: &Identifier,
    ) -> Result<InstantMessage, PackError> {
        //
        //  1. Unwrap the message key with the receiver's private key.
        //
        let key_data = match msg.encrypted_key_for(receiver) {
            Some(wrapped) => Some(
                self.delegate
                    .decrypt_key(wrapped, receiver, msg)
                    .ok_or(PackError::UndecryptableKey)?,
            ),
            // omitted key: reused or broadcast, resolved from cache below
            None => None,
        };

        //
        //  2. Deserialize the key, consulting the reuse cache when absent.
        //
        let key = self
            .delegate
            .deserialize_key(key_data.as_deref(), msg)
            .ok_or(PackError::NoCipherKey)?;

        //
        //  3. Decrypt and deserialize the content.
        //
        if msg.data.is_empty() {
            return Err(PackError::EmptyData);
        }
        let body = self
            .delegate
            .decrypt_content(&msg.data, &key, msg)
            .ok_or(PackError::DecryptFailed)?;
        let content = self
            .delegate
            .deserialize_content(&body, &key, msg)
            .ok_or(PackError::ContentCorrupted)?;

        Ok(InstantMessage::new(msg.envelope.clone(), content))
    }

    /// Sign message data, producing the wire form.
    ///
    /// The signature covers exactly the bytes of `data`; empty data is a
    /// precondition violation, never a recoverable condition.
    pub fn sign_message(&self, msg: &SecureMessage) -> Result<ReliableMessage, PackError> {
        if msg.data.is_empty() {
            return Err(PackError::EmptyData);
        }
        let signature = self
            .delegate
            .sign_data(&msg.data, msg)
            .ok_or(PackError::SignerMissing)?;
        Ok(ReliableMessage::from_secure(
            msg.clone(),
            Bytes::from(signature),
        ))
    }

    /// Re-address a group message to a single member.
    ///
    /// Moves the group into the `group` field, puts the member in
    /// `receiver`, and collapses the `keys` map to the member's own `key`.
    pub fn trim(&self, msg: &SecureMessage, member: &Identifier) -> Result<SecureMessage, PackError> {
        let mut envelope = msg.envelope.clone();
        let group = match envelope.group.take() {
            Some(group) => group,
            // without a group field the receiver must be the group itself
            None if envelope.receiver != *member => envelope.receiver.clone(),
            None => return Err(PackError::NotGroupMessage),
        };

        let key = match (&msg.key, &msg.keys) {
            (Some(key), _) => Some(key.clone()),
            (None, Some(_)) => msg
                .encrypted_key_for(member)
                .map(Bytes::copy_from_slice),
            (None, None) => None,
        };

        envelope.receiver = member.clone();
        envelope.group = Some(group);
        Ok(SecureMessage {
            envelope,
            data: msg.data.clone(),
            key,
            keys: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::InstantMessagePacker;
    use crate::testutil::{ids, MockDelegate};
    use dimp_core::{Content, ContentBody, Envelope, VerifyKey};
    use dimp_keyring::MessageKey;

    fn packed(delegate: &MockDelegate, text: &str) -> (InstantMessage, SecureMessage, MessageKey) {
        let msg = delegate.instant(ids("alice@8f3a"), ids("bob@9c1d"), Content::text(text));
        let key = MessageKey::generate();
        let secure = InstantMessagePacker::new(delegate)
            .encrypt_message(&msg, &key, None)
            .unwrap()
            .unwrap();
        (msg, secure, key)
    }

    #[test]
    fn test_decrypt_reproduces_content() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (instant, secure, _) = packed(&delegate, "Hello");

        let back = SecureMessagePacker::new(&delegate)
            .decrypt_message(&secure, &ids("bob@9c1d"))
            .unwrap();

        assert_eq!(back.content, instant.content);
        assert_eq!(back.envelope, instant.envelope);
        assert!(matches!(&back.content.body, ContentBody::Text { text } if text == "Hello"));
    }

    #[test]
    fn test_undecryptable_key_is_fatal() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (_, mut secure, _) = packed(&delegate, "Hello");

        // corrupt the wrapped key
        secure.key = Some(Bytes::from_static(&[0u8; 60]));

        let err = SecureMessagePacker::new(&delegate)
            .decrypt_message(&secure, &ids("bob@9c1d"))
            .unwrap_err();
        assert!(matches!(err, PackError::UndecryptableKey));
    }

    #[test]
    fn test_missing_key_without_cache_is_fatal() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (_, mut secure, _) = packed(&delegate, "Hello");

        secure.key = None;

        let err = SecureMessagePacker::new(&delegate)
            .decrypt_message(&secure, &ids("bob@9c1d"))
            .unwrap_err();
        assert!(matches!(err, PackError::NoCipherKey));
    }

    #[test]
    fn test_missing_key_with_cache_succeeds() {
        let mut delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (instant, mut secure, key) = packed(&delegate, "Hello");

        secure.key = None;
        delegate.cache_key(key);

        let back = SecureMessagePacker::new(&delegate)
            .decrypt_message(&secure, &ids("bob@9c1d"))
            .unwrap();
        assert_eq!(back.content, instant.content);
    }

    #[test]
    fn test_wrong_receiver_cannot_decrypt() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d", "carol@77aa"]);
        let (_, secure, _) = packed(&delegate, "Hello");

        // carol holds a different private key; the wrap must not open
        let err = SecureMessagePacker::new(&delegate)
            .decrypt_message(&secure, &ids("carol@77aa"))
            .unwrap_err();
        assert!(matches!(err, PackError::UndecryptableKey));
    }

    #[test]
    fn test_sign_empty_data_is_violation() {
        let delegate = MockDelegate::with_recipients(&[]);
        let msg = SecureMessage {
            envelope: Envelope::new(ids("alice@8f3a"), ids("bob@9c1d"), 0),
            data: Bytes::new(),
            key: None,
            keys: None,
        };

        let err = SecureMessagePacker::new(&delegate).sign_message(&msg).unwrap_err();
        assert!(matches!(err, PackError::EmptyData));
    }

    #[test]
    fn test_sign_covers_data_bytes() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (_, secure, _) = packed(&delegate, "Hello");

        let reliable = SecureMessagePacker::new(&delegate).sign_message(&secure).unwrap();
        assert_eq!(reliable.data, secure.data);
        assert!(delegate
            .signer_public_key()
            .verify(&reliable.data, &reliable.signature));
    }

    #[test]
    fn test_trim_collapses_keys_to_member() {
        let delegate = MockDelegate::with_recipients(&["a@aa", "b@bb"]);
        let group = ids("club@77aa");
        let msg = delegate.group_instant(ids("alice@8f3a"), group.clone(), Content::text("x"));
        let key = MessageKey::generate();
        let members = vec![ids("a@aa"), ids("b@bb")];
        let secure = InstantMessagePacker::new(&delegate)
            .encrypt_message(&msg, &key, Some(&members))
            .unwrap()
            .unwrap();

        let trimmed = SecureMessagePacker::new(&delegate)
            .trim(&secure, &ids("a@aa"))
            .unwrap();

        assert_eq!(trimmed.envelope.receiver, ids("a@aa"));
        assert_eq!(trimmed.envelope.group, Some(group));
        assert!(trimmed.keys.is_none());
        assert!(trimmed.key.is_some());

        // the member can still decrypt after trimming
        let back = SecureMessagePacker::new(&delegate)
            .decrypt_message(&trimmed, &ids("a@aa"))
            .unwrap();
        assert_eq!(back.content, msg.content);
    }

    #[test]
    fn test_trim_personal_message_rejected() {
        let delegate = MockDelegate::with_recipients(&["bob@9c1d"]);
        let (_, secure, _) = packed(&delegate, "Hello");

        let err = SecureMessagePacker::new(&delegate)
            .trim(&secure, &ids("bob@9c1d"))
            .unwrap_err();
        assert!(matches!(err, PackError::NotGroupMessage));
    }
}
