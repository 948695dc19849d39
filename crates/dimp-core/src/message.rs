//! The three message states.
//!
//! A message moves through exactly three forms: plaintext
//! ([`InstantMessage`], in memory only), encrypted ([`SecureMessage`]) and
//! encrypted-and-signed ([`ReliableMessage`], the only form that travels).
//! Each stage produces a new value; nothing is mutated in place.
//!
//! On the wire all binary fields are base64 strings, with one exception:
//! a broadcast message's `data` is the serialized content itself, carried
//! as plain UTF-8 text, because broadcast content is framed but never
//! secrecy-protected.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::envelope::Envelope;
use crate::error::CoreError;
use crate::identifier::Identifier;

/// A plaintext message. Exists only in memory on sender and receiver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstantMessage {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub content: Content,
}

impl InstantMessage {
    pub fn new(envelope: Envelope, content: Content) -> Self {
        Self { envelope, content }
    }
}

/// An encrypted message: `content` replaced by ciphertext `data`, with the
/// message key wrapped for the receiver (`key`) or for each group member
/// (`keys`). Both fields are absent for broadcast and reused-key messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "SecureMessageWire", try_from = "SecureMessageWire")]
pub struct SecureMessage {
    pub envelope: Envelope,
    pub data: Bytes,
    pub key: Option<Bytes>,
    pub keys: Option<BTreeMap<String, Vec<u8>>>,
}

impl SecureMessage {
    /// Find the wrapped key addressed to this receiver.
    ///
    /// Checks the single `key` field first, then the `keys` map under the
    /// receiver's full identifier (with terminal) and its bare form.
    pub fn encrypted_key_for(&self, receiver: &Identifier) -> Option<&[u8]> {
        if let Some(key) = &self.key {
            return Some(key);
        }
        let keys = self.keys.as_ref()?;
        if receiver.terminal().is_some() {
            if let Some(data) = keys.get(&receiver.to_string()) {
                return Some(data);
            }
        }
        keys.get(&receiver.without_terminal().to_string())
            .map(Vec::as_slice)
    }
}

/// An encrypted, signed message: the wire form.
///
/// `signature` covers exactly the bytes of `data` at signing time. The
/// optional `meta`/`visa` attachments let a sender introduce its identity
/// documents on first contact; they are opaque to the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReliableMessageWire", try_from = "ReliableMessageWire")]
pub struct ReliableMessage {
    pub envelope: Envelope,
    pub data: Bytes,
    pub key: Option<Bytes>,
    pub keys: Option<BTreeMap<String, Vec<u8>>>,
    pub signature: Bytes,
    pub meta: Option<serde_json::Value>,
    pub visa: Option<serde_json::Value>,
}

impl ReliableMessage {
    pub fn from_secure(msg: SecureMessage, signature: Bytes) -> Self {
        Self {
            envelope: msg.envelope,
            data: msg.data,
            key: msg.key,
            keys: msg.keys,
            signature,
            meta: None,
            visa: None,
        }
    }

    /// Strip the signature (and any identity attachments), yielding the
    /// secure form for the decrypt stage.
    pub fn into_secure(self) -> SecureMessage {
        SecureMessage {
            envelope: self.envelope,
            data: self.data,
            key: self.key,
            keys: self.keys,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire forms
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct SecureMessageWire {
    #[serde(flatten)]
    envelope: Envelope,
    data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keys: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize)]
struct ReliableMessageWire {
    #[serde(flatten)]
    envelope: Envelope,
    data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keys: Option<BTreeMap<String, String>>,
    signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visa: Option<serde_json::Value>,
}

/// Broadcast `data` travels as plain text; everything else is base64.
fn encode_data(envelope: &Envelope, data: &[u8]) -> String {
    if envelope.is_broadcast() {
        String::from_utf8_lossy(data).into_owned()
    } else {
        BASE64.encode(data)
    }
}

fn decode_data(envelope: &Envelope, data: &str) -> Result<Bytes, CoreError> {
    let bytes = if envelope.is_broadcast() {
        Bytes::copy_from_slice(data.as_bytes())
    } else {
        Bytes::from(BASE64.decode(data).map_err(|e| CoreError::InvalidBase64 {
            field: "data".into(),
            reason: e.to_string(),
        })?)
    };
    if bytes.is_empty() {
        return Err(CoreError::MalformedMessage("empty data".into()));
    }
    Ok(bytes)
}

fn encode_keys(keys: &BTreeMap<String, Vec<u8>>) -> BTreeMap<String, String> {
    keys.iter()
        .map(|(target, data)| (target.clone(), BASE64.encode(data)))
        .collect()
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, CoreError> {
    BASE64.decode(value).map_err(|e| CoreError::InvalidBase64 {
        field: field.into(),
        reason: e.to_string(),
    })
}

fn decode_key_fields(
    key: Option<String>,
    keys: Option<BTreeMap<String, String>>,
) -> Result<(Option<Bytes>, Option<BTreeMap<String, Vec<u8>>>), CoreError> {
    if key.is_some() && keys.is_some() {
        return Err(CoreError::MalformedMessage(
            "both 'key' and 'keys' present".into(),
        ));
    }
    let key = key
        .map(|k| decode_field("key", &k).map(Bytes::from))
        .transpose()?;
    let keys = keys
        .map(|map| {
            map.into_iter()
                .map(|(target, value)| Ok((target, decode_field("keys", &value)?)))
                .collect::<Result<BTreeMap<_, _>, CoreError>>()
        })
        .transpose()?;
    Ok((key, keys))
}

impl From<SecureMessage> for SecureMessageWire {
    fn from(msg: SecureMessage) -> Self {
        Self {
            data: encode_data(&msg.envelope, &msg.data),
            key: msg.key.as_deref().map(|k| BASE64.encode(k)),
            keys: msg.keys.as_ref().map(encode_keys),
            envelope: msg.envelope,
        }
    }
}

impl TryFrom<SecureMessageWire> for SecureMessage {
    type Error = CoreError;

    fn try_from(wire: SecureMessageWire) -> Result<Self, Self::Error> {
        let data = decode_data(&wire.envelope, &wire.data)?;
        let (key, keys) = decode_key_fields(wire.key, wire.keys)?;
        Ok(Self {
            envelope: wire.envelope,
            data,
            key,
            keys,
        })
    }
}

impl From<ReliableMessage> for ReliableMessageWire {
    fn from(msg: ReliableMessage) -> Self {
        Self {
            data: encode_data(&msg.envelope, &msg.data),
            key: msg.key.as_deref().map(|k| BASE64.encode(k)),
            keys: msg.keys.as_ref().map(encode_keys),
            signature: BASE64.encode(&msg.signature),
            meta: msg.meta,
            visa: msg.visa,
            envelope: msg.envelope,
        }
    }
}

impl TryFrom<ReliableMessageWire> for ReliableMessage {
    type Error = CoreError;

    fn try_from(wire: ReliableMessageWire) -> Result<Self, Self::Error> {
        let data = decode_data(&wire.envelope, &wire.data)?;
        let (key, keys) = decode_key_fields(wire.key, wire.keys)?;
        let signature = Bytes::from(decode_field("signature", &wire.signature)?);
        Ok(Self {
            envelope: wire.envelope,
            data,
            key,
            keys,
            signature,
            meta: wire.meta,
            visa: wire.visa,
        })
    }
}
