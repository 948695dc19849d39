//! Visa agent: key-selection policy.
//!
//! Decides which of an identity's public keys to use. The meta key never
//! changes, so wrapping with a visa's device key is always preferred; the
//! meta key is only a fallback. Verification runs the other way around:
//! the sender may have signed with a device key or with its identity key,
//! so both are offered, most current first.

use dimp_core::crypto::{Ed25519PublicKey, EncryptKey};

use crate::bundle::{EncryptedBundle, ANY_TERMINAL};
use crate::document::{Meta, Visa};

/// Key-selection policy over an identity's meta and visa documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct VisaAgent;

impl VisaAgent {
    /// Wrap a secret once per device terminal.
    ///
    /// Documents without a usable exchange key are skipped, as is any
    /// document naming a terminal that is already filled. When no document
    /// yields a key, the meta exchange key (if any) is used under `"*"`.
    /// The result may be empty if no key was usable anywhere.
    pub fn encrypt_bundle(
        &self,
        plaintext: &[u8],
        meta: &Meta,
        documents: &[Visa],
    ) -> EncryptedBundle {
        let mut bundle = EncryptedBundle::new();
        for doc in documents {
            let Some(key) = &doc.exchange_key else {
                continue;
            };
            let terminal = doc.terminal.as_deref().filter(|t| !t.is_empty());
            let terminal = terminal.unwrap_or(ANY_TERMINAL);
            if bundle.get(terminal).is_some() {
                // duplicated visa terminal; first document wins
                continue;
            }
            bundle.put(terminal, key.seal(plaintext));
        }
        if bundle.is_empty() {
            if let Some(key) = &meta.exchange_key {
                bundle.put(ANY_TERMINAL, key.seal(plaintext));
            }
        }
        bundle
    }

    /// Verification keys in trial order: one per document carrying a key,
    /// then the identity's meta key.
    pub fn verify_keys(&self, meta: &Meta, documents: &[Visa]) -> Vec<Ed25519PublicKey> {
        let mut keys: Vec<Ed25519PublicKey> =
            documents.iter().filter_map(|doc| doc.sign_key).collect();
        keys.push(meta.sign_key);
        keys
    }

    /// The device labels a sender should fan a key out to, in document
    /// order, deduplicated, defaulting to `"*"` for unlabeled documents.
    pub fn terminals(&self, documents: &[Visa]) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for doc in documents {
            let terminal = doc.terminal.as_deref().filter(|t| !t.is_empty());
            let terminal = terminal.unwrap_or(ANY_TERMINAL);
            if !labels.iter().any(|t| t == terminal) {
                labels.push(terminal.to_string());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimp_core::crypto::DecryptKey;
    use dimp_core::SignKeypair;

    use crate::crypto::X25519StaticSecret;

    #[test]
    fn test_visa_keys_preferred_over_meta() {
        let meta_secret = X25519StaticSecret::generate();
        let tablet_secret = X25519StaticSecret::generate();

        let meta = Meta::new(SignKeypair::generate().public_key())
            .with_exchange_key(meta_secret.public_key());
        let docs = vec![Visa::new()
            .with_exchange_key(tablet_secret.public_key())
            .with_terminal("tablet")];

        let agent = VisaAgent;
        let bundle = agent.encrypt_bundle(b"secret", &meta, &docs);

        assert_eq!(bundle.len(), 1);
        let sealed = bundle.get("tablet").unwrap();
        assert_eq!(tablet_secret.open(sealed).unwrap(), b"secret");
    }

    #[test]
    fn test_meta_fallback_under_any_terminal() {
        let meta_secret = X25519StaticSecret::generate();
        let meta = Meta::new(SignKeypair::generate().public_key())
            .with_exchange_key(meta_secret.public_key());

        // One keyless visa, one empty document list: both fall back to meta
        let agent = VisaAgent;
        for docs in [vec![], vec![Visa::new().with_terminal("phone")]] {
            let bundle = agent.encrypt_bundle(b"secret", &meta, &docs);
            assert_eq!(bundle.len(), 1);
            let sealed = bundle.get(ANY_TERMINAL).unwrap();
            assert_eq!(meta_secret.open(sealed).unwrap(), b"secret");
        }
    }

    #[test]
    fn test_no_usable_key_yields_empty_bundle() {
        let meta = Meta::new(SignKeypair::generate().public_key());
        let bundle = VisaAgent.encrypt_bundle(b"secret", &meta, &[]);
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_duplicate_terminal_first_document_wins() {
        let first = X25519StaticSecret::generate();
        let second = X25519StaticSecret::generate();
        let meta = Meta::new(SignKeypair::generate().public_key());
        let docs = vec![
            Visa::new().with_exchange_key(first.public_key()).with_terminal("phone"),
            Visa::new().with_exchange_key(second.public_key()).with_terminal("phone"),
        ];

        let bundle = VisaAgent.encrypt_bundle(b"secret", &meta, &docs);
        assert_eq!(bundle.len(), 1);
        assert_eq!(first.open(bundle.get("phone").unwrap()).unwrap(), b"secret");
        assert!(second.open(bundle.get("phone").unwrap()).is_none());
    }

    #[test]
    fn test_verify_keys_order() {
        let identity = SignKeypair::generate();
        let device = SignKeypair::generate();
        let meta = Meta::new(identity.public_key());
        let docs = vec![
            Visa::new().with_sign_key(device.public_key()).with_terminal("phone"),
            Visa::new().with_terminal("tablet"),
        ];

        let keys = VisaAgent.verify_keys(&meta, &docs);
        assert_eq!(keys, vec![device.public_key(), identity.public_key()]);
    }

    #[test]
    fn test_terminals_dedup_and_default() {
        let docs = vec![
            Visa::new().with_terminal("phone"),
            Visa::new(),
            Visa::new().with_terminal("phone"),
            Visa::new().with_terminal("tablet"),
        ];
        let labels = VisaAgent.terminals(&docs);
        assert_eq!(labels, vec!["phone", "*", "tablet"]);
    }
}
