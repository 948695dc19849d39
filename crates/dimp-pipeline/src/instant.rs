//! Instant packer: the encrypt transform.
//!
//! ```text
//!   +----------+      +----------+
//!   | sender   |      | sender   |
//!   | receiver |      | receiver |
//!   | time     |  ->  | time     |
//!   |          |      |          |
//!   | content  |      | data     |  1. data = encrypt(content, PW)
//!   +----------+      | key/keys |  2. key  = seal(PW, receiver.PK)
//!                     +----------+
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;

use dimp_core::{Envelope, Identifier, InstantMessage, SecureMessage};
use dimp_keyring::ANY_TERMINAL;

use crate::delegate::InstantMessageDelegate;
use crate::error::PackError;

/// Encrypts an instant message into a secure message.
pub struct InstantMessagePacker<'a, D> {
    delegate: &'a D,
}

impl<'a, D: InstantMessageDelegate> InstantMessagePacker<'a, D> {
    pub fn new(delegate: &'a D) -> Self {
        Self { delegate }
    }

    /// Encrypt a personal or group message.
    ///
    /// `members` carries the group roster for a group message; `None` packs
    /// for the envelope receiver alone.
    ///
    /// Returns `Ok(None)` when no recipient key could be resolved: the
    /// caller must hold the instant message and retry once the missing visa
    /// arrives. Group members whose key cannot be resolved are skipped and
    /// implicitly excluded from this delivery.
    pub fn encrypt_message(
        &self,
        msg: &InstantMessage,
        key: &D::Key,
        members: Option<&[Identifier]>,
    ) -> Result<Option<SecureMessage>, PackError> {
        //
        //  1. Serialize content, then encrypt it with the message key.
        //     For broadcast the key is the plain compatibility cipher, so
        //     'data' stays the serialized content and the wire codec frames
        //     it as text rather than base64.
        //
        let body = self.delegate.serialize_content(&msg.content, key, msg);
        let data = Bytes::from(self.delegate.encrypt_content(&body, key, msg));

        //
        //  2. Serialize the message key. Nothing to attach for broadcast or
        //     for a reused key: the receiver recovers it from its own cache.
        //
        let Some(key_data) = self.delegate.serialize_key(key, msg) else {
            return Ok(Some(finish(msg.envelope.clone(), data, None, None)));
        };

        //
        //  3. Wrap the key for the receiver, or once per group member.
        //
        match members {
            None => self.pack_personal(msg, data, &key_data),
            Some(members) => self.pack_group(msg, data, &key_data, members),
        }
    }

    fn pack_personal(
        &self,
        msg: &InstantMessage,
        data: Bytes,
        key_data: &[u8],
    ) -> Result<Option<SecureMessage>, PackError> {
        let receiver = msg.envelope.receiver.without_terminal();
        let Some(bundle) = self.delegate.encrypt_key(key_data, &receiver, msg) else {
            return Ok(None);
        };
        if bundle.is_empty() {
            return Ok(None);
        }
        // A single device-less wrap collapses into 'key'; anything fanned
        // out per terminal travels in 'keys'.
        if bundle.len() == 1 {
            if let Some(wrapped) = bundle.get(ANY_TERMINAL) {
                let key = Bytes::copy_from_slice(wrapped);
                return Ok(Some(finish(msg.envelope.clone(), data, Some(key), None)));
            }
        }
        let keys = bundle.encode(&receiver)?;
        Ok(Some(finish(msg.envelope.clone(), data, None, Some(keys))))
    }

    fn pack_group(
        &self,
        msg: &InstantMessage,
        data: Bytes,
        key_data: &[u8],
        members: &[Identifier],
    ) -> Result<Option<SecureMessage>, PackError> {
        let mut keys = BTreeMap::new();
        for member in members {
            let member = member.without_terminal();
            match self.delegate.encrypt_key(key_data, &member, msg) {
                Some(bundle) if !bundle.is_empty() => {
                    keys.extend(bundle.encode(&member)?);
                }
                _ => {
                    // excluded from this delivery; served by redelivery
                    // once the member's visa arrives
                    tracing::warn!(member = %member, "no visa key for group member, skipping");
                }
            }
        }
        if keys.is_empty() {
            return Ok(None);
        }
        Ok(Some(finish(msg.envelope.clone(), data, None, Some(keys))))
    }
}

fn finish(
    envelope: Envelope,
    data: Bytes,
    key: Option<Bytes>,
    keys: Option<BTreeMap<String, Vec<u8>>>,
) -> SecureMessage {
    SecureMessage {
        envelope,
        data,
        key,
        keys,
    }
}
