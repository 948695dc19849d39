//! # dimp-keyring
//!
//! Key material and fan-out policy for the DIMP message pipeline.
//!
//! ## Overview
//!
//! Encrypting a message uses a two-layer key model:
//!
//! 1. **Message Key**: a symmetric key ([`MessageKey`]) that encrypts the
//!    serialized content
//! 2. **Key Wraps**: the message key is sealed for each recipient device
//!    with X25519 ([`EncryptedBundle`])
//!
//! Which public key seals each wrap is policy: the [`VisaAgent`] prefers
//! the per-device keys advertised in [`Visa`] documents and falls back to
//! the identity's immutable [`Meta`] key.
//!
//! The [`KeyCache`] owns message-key reuse: once a key has been delivered,
//! later messages may omit the wrapped key entirely and the receiver
//! recovers it from its own cache.

pub mod agent;
pub mod bundle;
pub mod cache;
pub mod crypto;
pub mod document;
pub mod error;

pub use agent::VisaAgent;
pub use bundle::{EncryptedBundle, ANY_TERMINAL};
pub use cache::{destination, KeyCache, MemoryKeyCache};
pub use crypto::{MessageKey, X25519PublicKey, X25519StaticSecret};
pub use document::{Meta, Visa};
pub use error::KeyringError;
