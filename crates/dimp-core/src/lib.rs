//! # dimp-core
//!
//! Pure value types for the DIMP message pipeline: identifiers, envelopes,
//! typed content, the three message states and the crypto capability
//! contracts the pipeline is generic over.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over protocol data structures.
//!
//! ## Key Types
//!
//! - [`Identifier`] - An entity as `name@address[/terminal]`
//! - [`Envelope`] - Immutable routing header
//! - [`Content`] - Closed sum type of application payloads
//! - [`InstantMessage`] / [`SecureMessage`] / [`ReliableMessage`] - The
//!   three message states (plaintext, encrypted, encrypted-and-signed)
//!
//! ## Wire Format
//!
//! Messages serialize to JSON with case-sensitive field names; binary
//! fields are base64 except a broadcast message's `data`, which is plain
//! UTF-8 text. See [`message`].

pub mod content;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod identifier;
pub mod message;

pub use content::{Content, ContentBody};
pub use crypto::{
    DecryptKey, Ed25519PublicKey, Ed25519Signature, EncryptKey, SignKey, SignKeypair,
    SymmetricCipher, VerifyKey,
};
pub use envelope::Envelope;
pub use error::CoreError;
pub use identifier::{Address, Identifier, ANYWHERE, EVERYWHERE};
pub use message::{InstantMessage, ReliableMessage, SecureMessage};
