//! Encrypted key bundle.
//!
//! One logical identity may resolve to several device-specific public keys.
//! The bundle holds the same secret wrapped once per terminal, so a single
//! message can serve every active device of one receiver.
//!
//! On the wire each entry lands in the message `keys` map under
//! `"<identifier>"` (for the `"*"` terminal) or `"<identifier>/<terminal>"`.

use std::collections::BTreeMap;

use dimp_core::Identifier;

use crate::error::{KeyringError, Result};

/// The pseudo-terminal meaning "no specific device".
pub const ANY_TERMINAL: &str = "*";

/// The same secret, wrapped once per terminal of one identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncryptedBundle {
    map: BTreeMap<String, Vec<u8>>,
}

impl EncryptedBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, terminal: &str) -> Option<&[u8]> {
        self.map.get(terminal).map(Vec::as_slice)
    }

    /// Insert wrapped data for a terminal; empty data removes the entry.
    /// Returns the previous entry, if any.
    pub fn put(&mut self, terminal: &str, data: Vec<u8>) -> Option<Vec<u8>> {
        if data.is_empty() {
            return self.remove(terminal);
        }
        self.map.insert(terminal.to_string(), data)
    }

    pub fn remove(&mut self, terminal: &str) -> Option<Vec<u8>> {
        self.map.remove(terminal)
    }

    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.map.iter().map(|(t, d)| (t.as_str(), d.as_slice()))
    }

    /// Encode into wire map entries for the message `keys` field.
    ///
    /// The identity must not itself carry a terminal: terminal information
    /// comes only from the bundle's own entries.
    pub fn encode(&self, did: &Identifier) -> Result<BTreeMap<String, Vec<u8>>> {
        if did.terminal().is_some() {
            return Err(KeyringError::IdentifierHasTerminal(did.to_string()));
        }
        let identifier = did.to_string();
        let mut wire = BTreeMap::new();
        for (terminal, data) in &self.map {
            let target = if terminal.is_empty() || terminal == ANY_TERMINAL {
                identifier.clone()
            } else {
                format!("{identifier}/{terminal}")
            };
            wire.insert(target, data.clone());
        }
        Ok(wire)
    }

    /// Rebuild a bundle from wire map entries.
    ///
    /// Each expected terminal is looked up under its wire key; terminals
    /// absent from the wire map are skipped. Two wire entries landing on the
    /// same terminal is a protocol violation.
    pub fn decode(
        wire: &BTreeMap<String, Vec<u8>>,
        did: &Identifier,
        terminals: &[String],
    ) -> Result<Self> {
        let identifier = did.without_terminal().to_string();
        let mut bundle = Self::new();
        for item in terminals {
            let target = if item.is_empty() { ANY_TERMINAL } else { item };
            let wire_key = if target == ANY_TERMINAL {
                identifier.clone()
            } else {
                format!("{identifier}/{target}")
            };
            let Some(data) = wire.get(&wire_key) else {
                // key data not delivered for this terminal
                continue;
            };
            if bundle.put(target, data.clone()).is_some() {
                return Err(KeyringError::DuplicateTerminal(target.to_string()));
            }
        }
        Ok(bundle)
    }
}
