//! Crypto capability contracts and signing primitives.
//!
//! The pipeline is generic over these narrow traits; concrete ciphers live
//! with the caller. Ed25519 signing is provided here with strong types
//! because every deployment needs it for the reliable-message stage.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A symmetric cipher: one shared secret, both directions.
pub trait SymmetricCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8>;

    /// Returns `None` when the ciphertext does not authenticate under this
    /// key (wrong key, truncation, tampering).
    fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>>;
}

/// A private signing capability.
pub trait SignKey {
    fn sign(&self, data: &[u8]) -> Vec<u8>;
}

/// A public verification capability.
pub trait VerifyKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// A public key-wrapping capability: seal a small secret for the holder of
/// the matching private key.
pub trait EncryptKey {
    fn seal(&self, plaintext: &[u8]) -> Vec<u8>;
}

/// The private half of [`EncryptKey`].
pub trait DecryptKey {
    /// Returns `None` when the sealed box does not open under this key.
    fn open(&self, ciphertext: &[u8]) -> Option<Vec<u8>>;
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl VerifyKey for Ed25519PublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        verifying_key
            .verify(data, &Signature::from_bytes(&sig_bytes))
            .is_ok()
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A keypair for signing message data.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct SignKeypair {
    signing_key: SigningKey,
}

impl SignKeypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, data: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data).to_bytes())
    }
}

impl SignKey for SignKeypair {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        SignKeypair::sign(self, data).as_bytes().to_vec()
    }
}

impl fmt::Debug for SignKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignKeypair({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = SignKeypair::generate();
        let data = b"encrypted message data";
        let signature = keypair.sign(data);

        assert!(keypair.public_key().verify(data, signature.as_ref()));

        // Tampered data must not verify
        assert!(!keypair.public_key().verify(b"Encrypted message data", signature.as_ref()));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let alice = SignKeypair::generate();
        let mallory = SignKeypair::generate();
        let signature = alice.sign(b"data");

        assert!(!mallory.public_key().verify(b"data", signature.as_ref()));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = SignKeypair::from_seed(&[0x42; 32]);
        let kp2 = SignKeypair::from_seed(&[0x42; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = SignKeypair::generate().public_key();
        let recovered = Ed25519PublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_bad_signature_length_rejected() {
        let keypair = SignKeypair::generate();
        assert!(!keypair.public_key().verify(b"data", &[0u8; 12]));
    }
}
