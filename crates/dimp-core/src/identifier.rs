//! Entity identifiers.
//!
//! An identifier names one entity as `name@address`, optionally qualified
//! with a `/terminal` suffix naming a specific device session. The terminal
//! is a routing hint, not part of identity: two identifiers are equal when
//! name and address match, whatever their terminals say.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Reserved address meaning "any user, anywhere".
pub const ANYWHERE: &str = "anywhere";

/// Reserved address meaning "every member, everywhere".
pub const EVERYWHERE: &str = "everywhere";

/// An opaque address fingerprint.
///
/// The address is the stable part of an identifier. How it is derived from
/// key material is an identity-system concern; this crate only validates and
/// transports it. The two reserved values mark the broadcast addresses.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Validate and wrap an address string.
    pub fn new(address: impl Into<String>) -> Result<Self, CoreError> {
        let address = address.into();
        if address.is_empty() {
            return Err(CoreError::InvalidAddress("empty".into()));
        }
        if address.contains(['@', '/']) || address.contains(char::is_whitespace) {
            return Err(CoreError::InvalidAddress(address));
        }
        Ok(Self(address))
    }

    /// The reserved "anywhere" broadcast address.
    pub fn anywhere() -> Self {
        Self(ANYWHERE.into())
    }

    /// The reserved "everywhere" broadcast address.
    pub fn everywhere() -> Self {
        Self(EVERYWHERE.into())
    }

    /// Derive an address fingerprint from seed material.
    pub fn generate(seed: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(seed).as_bytes())[..40].to_string())
    }

    /// Get the address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is one of the reserved broadcast addresses.
    pub fn is_broadcast(&self) -> bool {
        self.0.eq_ignore_ascii_case(ANYWHERE) || self.0.eq_ignore_ascii_case(EVERYWHERE)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

/// An entity identifier: `name@address[/terminal]`.
#[derive(Clone, Debug, Eq)]
pub struct Identifier {
    name: Option<String>,
    address: Address,
    terminal: Option<String>,
}

impl Identifier {
    /// Build an identifier from its parts.
    pub fn new(
        name: Option<&str>,
        address: Address,
        terminal: Option<&str>,
    ) -> Result<Self, CoreError> {
        if let Some(name) = name {
            if name.is_empty() || name.contains(['@', '/']) {
                return Err(CoreError::InvalidIdentifier(format!("bad name: {name}")));
            }
        }
        if let Some(terminal) = terminal {
            if terminal.is_empty() || terminal.contains(['@', '/']) {
                return Err(CoreError::InvalidIdentifier(format!(
                    "bad terminal: {terminal}"
                )));
            }
        }
        Ok(Self {
            name: name.map(str::to_string),
            address,
            terminal: terminal.map(str::to_string),
        })
    }

    /// Shorthand for a named identifier without a terminal.
    pub fn named(name: &str, address: Address) -> Result<Self, CoreError> {
        Self::new(Some(name), address, None)
    }

    /// The reserved broadcast user `anyone@anywhere`.
    pub fn anyone() -> Self {
        Self {
            name: Some("anyone".into()),
            address: Address::anywhere(),
            terminal: None,
        }
    }

    /// The reserved broadcast group `everyone@everywhere`.
    pub fn everyone() -> Self {
        Self {
            name: Some("everyone".into()),
            address: Address::everywhere(),
            terminal: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn terminal(&self) -> Option<&str> {
        self.terminal.as_deref()
    }

    /// Check whether this identifier is a reserved broadcast identity.
    pub fn is_broadcast(&self) -> bool {
        self.address.is_broadcast()
    }

    /// A copy of this identifier carrying the given terminal.
    pub fn with_terminal(&self, terminal: &str) -> Result<Self, CoreError> {
        Self::new(self.name.as_deref(), self.address.clone(), Some(terminal))
    }

    /// A copy of this identifier with the terminal stripped.
    pub fn without_terminal(&self) -> Self {
        Self {
            name: self.name.clone(),
            address: self.address.clone(),
            terminal: None,
        }
    }
}

// Terminal is a device qualifier, never part of identity.
impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.address == other.address
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}@")?;
        }
        f.write_str(self.address.as_str())?;
        if let Some(terminal) = &self.terminal {
            write!(f, "/{terminal}")?;
        }
        Ok(())
    }
}

impl FromStr for Identifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CoreError::InvalidIdentifier("empty".into()));
        }
        let (body, terminal) = match s.split_once('/') {
            Some((body, terminal)) => (body, Some(terminal)),
            None => (s, None),
        };
        let (name, address) = match body.split_once('@') {
            Some((name, address)) => (Some(name), address),
            None => (None, body),
        };
        Self::new(name, Address::new(address)?, terminal)
            .map_err(|_| CoreError::InvalidIdentifier(s.to_string()))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for s in ["alice@8f3a", "8f3a", "bob@9c1d/tablet", "anyone@anywhere"] {
            let id: Identifier = s.parse().unwrap();
            assert_eq!(id.to_string(), s);
        }
    }

    #[test]
    fn test_terminal_not_part_of_identity() {
        let plain: Identifier = "bob@9c1d".parse().unwrap();
        let tablet: Identifier = "bob@9c1d/tablet".parse().unwrap();
        let phone: Identifier = "bob@9c1d/phone".parse().unwrap();

        assert_eq!(plain, tablet);
        assert_eq!(tablet, phone);
        assert_eq!(tablet.without_terminal().terminal(), None);
    }

    #[test]
    fn test_broadcast_identities() {
        assert!(Identifier::anyone().is_broadcast());
        assert!(Identifier::everyone().is_broadcast());
        assert_eq!(Identifier::everyone().to_string(), "everyone@everywhere");

        let id: Identifier = "alice@8f3a".parse().unwrap();
        assert!(!id.is_broadcast());

        // Reserved addresses are matched case-insensitively
        let shouting: Identifier = "everyone@EVERYWHERE".parse().unwrap();
        assert!(shouting.is_broadcast());
    }

    #[test]
    fn test_reject_malformed() {
        assert!("".parse::<Identifier>().is_err());
        assert!("a@b@c".parse::<Identifier>().is_err());
        assert!("alice@".parse::<Identifier>().is_err());
        assert!("alice@addr/".parse::<Identifier>().is_err());
        assert!(Address::new("has space").is_err());
    }

    #[test]
    fn test_generated_addresses_differ() {
        let a = Address::generate(b"seed-a");
        let b = Address::generate(b"seed-b");
        assert_ne!(a, b);
        assert!(!a.is_broadcast());
    }

    #[test]
    fn test_serde_as_string() {
        let id: Identifier = "bob@9c1d/tablet".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"bob@9c1d/tablet\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back.terminal(), Some("tablet"));
    }
}
