//! Identity documents.
//!
//! A `Meta` is the immutable, self-certifying record of an identity: its
//! long-lived signing key, fixed for the identity's whole life. A `Visa` is
//! a mutable document an identity publishes per device, advertising current
//! communication keys under a terminal label. Resolution of identifier to
//! documents is an external concern; this crate only defines the shapes the
//! key-selection policy reads.

use serde::{Deserialize, Serialize};

use dimp_core::crypto::Ed25519PublicKey;

use crate::crypto::X25519PublicKey;

/// Immutable identity record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// The identity's long-lived verification key.
    pub sign_key: Ed25519PublicKey,

    /// Optional long-lived exchange key, used to wrap message keys when no
    /// visa advertises a device key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_key: Option<X25519PublicKey>,
}

impl Meta {
    pub fn new(sign_key: Ed25519PublicKey) -> Self {
        Self {
            sign_key,
            exchange_key: None,
        }
    }

    pub fn with_exchange_key(mut self, key: X25519PublicKey) -> Self {
        self.exchange_key = Some(key);
        self
    }
}

/// Mutable per-device document.
///
/// Any field may be absent: a visa without an exchange key cannot receive
/// wrapped message keys, one without a terminal counts as the `"*"` device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Visa {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_key: Option<X25519PublicKey>,

    /// Device-scoped verification key; senders may sign with this instead
    /// of their identity key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_key: Option<Ed25519PublicKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
}

impl Visa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchange_key(mut self, key: X25519PublicKey) -> Self {
        self.exchange_key = Some(key);
        self
    }

    pub fn with_sign_key(mut self, key: Ed25519PublicKey) -> Self {
        self.sign_key = Some(key);
        self
    }

    pub fn with_terminal(mut self, terminal: impl Into<String>) -> Self {
        self.terminal = Some(terminal.into());
        self
    }
}
