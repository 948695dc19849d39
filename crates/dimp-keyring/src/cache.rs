//! Message key reuse cache.
//!
//! The cache owns the lifecycle of symmetric message keys, vectored by
//! (sender, destination). The pipeline never decides caching policy; it is
//! handed a cache and asks it for keys. Implementations must be safe for
//! concurrent readers and tolerate last-writer-wins on insertion: the
//! protocol survives redundant re-derivation of a key, just not corruption
//! of one.

use std::collections::HashMap;
use std::sync::RwLock;

use dimp_core::Identifier;

use crate::crypto::MessageKey;

/// Cache of message keys per conversation direction.
pub trait KeyCache: Send + Sync {
    /// Get the key for messages from `sender` to `destination`, generating
    /// and caching a fresh one when `generate` is set. A broadcast
    /// destination always yields the plain compatibility key.
    fn cipher_key(
        &self,
        sender: &Identifier,
        destination: &Identifier,
        generate: bool,
    ) -> Option<MessageKey>;

    /// Store a key for reuse, replacing any cached value.
    fn cache_cipher_key(&self, sender: &Identifier, destination: &Identifier, key: MessageKey);
}

/// Resolve the cache destination for a message.
///
/// A group message is keyed by its group whichever member it was split for;
/// a broadcast group disables encryption outright, and a broadcast receiver
/// on a normal group (group commands in cleartext) does the same.
pub fn destination<'a>(
    receiver: &'a Identifier,
    group: Option<&'a Identifier>,
) -> &'a Identifier {
    match group {
        None => receiver,
        Some(group) if group.is_broadcast() => group,
        Some(_) if receiver.is_broadcast() => receiver,
        Some(group) => group,
    }
}

/// In-memory key cache.
#[derive(Default)]
pub struct MemoryKeyCache {
    keys: RwLock<HashMap<(Identifier, Identifier), MessageKey>>,
}

impl MemoryKeyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyCache for MemoryKeyCache {
    fn cipher_key(
        &self,
        sender: &Identifier,
        destination: &Identifier,
        generate: bool,
    ) -> Option<MessageKey> {
        if destination.is_broadcast() {
            return Some(MessageKey::Plain);
        }
        let mut keys = self.keys.write().expect("key cache lock poisoned");
        match keys.entry((sender.clone(), destination.clone())) {
            std::collections::hash_map::Entry::Occupied(entry) => Some(entry.get().clone()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                if !generate {
                    return None;
                }
                Some(entry.insert(MessageKey::generate()).clone())
            }
        }
    }

    fn cache_cipher_key(&self, sender: &Identifier, destination: &Identifier, key: MessageKey) {
        let mut keys = self.keys.write().expect("key cache lock poisoned");
        keys.insert((sender.clone(), destination.clone()), key);
    }
}
