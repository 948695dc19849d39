//! # dimp
//!
//! The unified API for the DIMP message pipeline: end-to-end encrypted
//! instant messaging without a trusted central relay.
//!
//! ## Overview
//!
//! A plaintext [`InstantMessage`] becomes a wire-safe, signed,
//! per-recipient-encrypted [`ReliableMessage`] and back:
//!
//! ```text
//! InstantMessage --encrypt--> SecureMessage --sign--> ReliableMessage
//! InstantMessage <--decrypt-- SecureMessage <--verify-- ReliableMessage
//! ```
//!
//! The [`MessagePacker`] drives the transformation over two injected
//! collaborators:
//!
//! - an [`IdentityDirectory`] resolving identifiers to their immutable
//!   `Meta` and current `Visa` documents (and holding local private keys)
//! - a [`KeyCache`](dimp_keyring::KeyCache) owning message-key reuse
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dimp::{MemoryDirectory, MessagePacker, Transceiver};
//! use dimp_core::{Content, Envelope, InstantMessage};
//! use dimp_keyring::MemoryKeyCache;
//!
//! let directory = MemoryDirectory::new();
//! // ... register metas, visas and local users ...
//! let packer = MessagePacker::new(Transceiver::new(directory, MemoryKeyCache::new()));
//!
//! let alice = "alice@8f3a".parse().unwrap();
//! let bob = "bob@9c1d".parse().unwrap();
//! let msg = InstantMessage::new(
//!     Envelope::new(alice, bob, 1736870400000),
//!     Content::text("Hello"),
//! );
//! match packer.pack(&msg, None) {
//!     Ok(Some(_reliable)) => { /* hand to transport */ }
//!     Ok(None) => { /* hold and retry once the receiver's visa arrives */ }
//!     Err(_) => { /* fatal for this message */ }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `dimp::core` - value types (messages, identifiers, content)
//! - `dimp::keyring` - key material, bundles, documents, cache
//! - `dimp::pipeline` - the three packers and their delegate seam

pub use dimp_core as core;
pub use dimp_keyring as keyring;
pub use dimp_pipeline as pipeline;

pub mod directory;
pub mod packer;
pub mod transceiver;

pub use directory::{IdentityDirectory, LocalUser, MemoryDirectory};
pub use packer::MessagePacker;
pub use transceiver::Transceiver;

pub use dimp_core::{
    Content, ContentBody, Envelope, Identifier, InstantMessage, ReliableMessage, SecureMessage,
};
pub use dimp_pipeline::PackError;
