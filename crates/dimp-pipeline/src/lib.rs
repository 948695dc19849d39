//! # dimp-pipeline
//!
//! The three-stage DIMP message transformation.
//!
//! ## Overview
//!
//! A message crosses the pipeline in both directions:
//!
//! ```text
//! InstantMessage --encrypt--> SecureMessage --sign--> ReliableMessage
//!                                                          |
//!                                                     (transport)
//!                                                          |
//! InstantMessage <--decrypt-- SecureMessage <--verify-- ReliableMessage
//! ```
//!
//! Each packer is a pure function of its inputs plus a borrowed
//! [`delegate`](crate::delegate): it holds no state, performs no I/O and
//! takes no locks. Blocking work (visa lookup, key fetch) lives in the
//! delegate's collaborators and surfaces here only as "key not resolved".
//!
//! ## Failure classes
//!
//! - **Expected absence** returns `Ok(None)`: a receiver whose visa is not
//!   yet known (retry later), a signature that does not verify (drop).
//! - **Fatal** returns [`PackError`]: empty data at sign time, missing
//!   fields at verify time, undecryptable or unresolvable keys, corrupt
//!   content. These abort the one message and nothing else.
//!
//! No partial output is ever produced.

pub mod delegate;
pub mod error;
pub mod instant;
pub mod reliable;
pub mod secure;
#[cfg(test)]
mod testutil;

pub use delegate::{InstantMessageDelegate, ReliableMessageDelegate, SecureMessageDelegate};
pub use error::PackError;
pub use instant::InstantMessagePacker;
pub use reliable::ReliableMessagePacker;
pub use secure::SecureMessagePacker;
