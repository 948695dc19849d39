//! Identity directory: the lookup seam.
//!
//! The pipeline resolves identities to key documents through this trait.
//! Resolution may be backed by anything (a database, a network fetch behind
//! a cache); the directory surfaces only what is already known, and a
//! missing answer becomes "key not resolved" upstream.

use std::collections::HashMap;
use std::sync::RwLock;

use dimp_core::{Identifier, SignKeypair};
use dimp_keyring::{Meta, Visa, X25519StaticSecret};

/// A user whose private keys are held on this device.
#[derive(Clone)]
pub struct LocalUser {
    pub id: Identifier,
    pub sign_keypair: SignKeypair,
    pub exchange_secret: X25519StaticSecret,
}

/// Lookup of identity documents and local private keys.
pub trait IdentityDirectory: Send + Sync {
    /// The identity's immutable meta record, if known.
    fn meta(&self, did: &Identifier) -> Option<Meta>;

    /// All currently published visa documents for the identity.
    fn documents(&self, did: &Identifier) -> Vec<Visa>;

    /// The local user matching this identifier, if its private keys are
    /// held here.
    fn local_user(&self, did: &Identifier) -> Option<LocalUser>;
}

/// In-memory identity directory.
#[derive(Default)]
pub struct MemoryDirectory {
    metas: RwLock<HashMap<Identifier, Meta>>,
    documents: RwLock<HashMap<Identifier, Vec<Visa>>>,
    users: RwLock<HashMap<Identifier, LocalUser>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_meta(&self, did: Identifier, meta: Meta) {
        let mut metas = self.metas.write().expect("directory lock poisoned");
        metas.insert(did, meta);
    }

    pub fn publish_document(&self, did: Identifier, visa: Visa) {
        let mut documents = self.documents.write().expect("directory lock poisoned");
        documents.entry(did).or_default().push(visa);
    }

    pub fn add_user(&self, user: LocalUser) {
        let mut users = self.users.write().expect("directory lock poisoned");
        users.insert(user.id.clone(), user);
    }
}

impl IdentityDirectory for MemoryDirectory {
    fn meta(&self, did: &Identifier) -> Option<Meta> {
        let metas = self.metas.read().expect("directory lock poisoned");
        metas.get(did).cloned()
    }

    fn documents(&self, did: &Identifier) -> Vec<Visa> {
        let documents = self.documents.read().expect("directory lock poisoned");
        documents.get(did).cloned().unwrap_or_default()
    }

    fn local_user(&self, did: &Identifier) -> Option<LocalUser> {
        let users = self.users.read().expect("directory lock poisoned");
        users.get(did).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    #[test]
    fn test_lookup_ignores_terminal() {
        let directory = MemoryDirectory::new();
        let meta = Meta::new(SignKeypair::generate().public_key());
        directory.register_meta(id("bob@9c1d"), meta.clone());

        assert_eq!(directory.meta(&id("bob@9c1d/tablet")), Some(meta));
        assert_eq!(directory.meta(&id("carol@77aa")), None);
    }

    #[test]
    fn test_documents_accumulate() {
        let directory = MemoryDirectory::new();
        let bob = id("bob@9c1d");
        directory.publish_document(bob.clone(), Visa::new().with_terminal("phone"));
        directory.publish_document(bob.clone(), Visa::new().with_terminal("tablet"));

        let docs = directory.documents(&bob);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].terminal.as_deref(), Some("phone"));
    }
}
