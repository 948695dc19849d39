//! Test fixtures and helpers.
//!
//! A fixture holds one shared directory and key cache, so tests can enroll
//! every party in the same world and drive both ends of the pipeline.

use dimp::{
    Content, Envelope, Identifier, InstantMessage, LocalUser, MemoryDirectory, MessagePacker,
    Transceiver,
};
use dimp_core::{Address, SignKeypair};
use dimp_keyring::{MemoryKeyCache, Meta, Visa, X25519StaticSecret};

/// Fixed timestamp for reproducible envelopes.
pub const TIME: i64 = 1736870400000;

/// A shared world: directory, cache and the packer over them.
pub struct TestFixture {
    packer: MessagePacker<MemoryDirectory, MemoryKeyCache>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            packer: MessagePacker::new(Transceiver::new(
                MemoryDirectory::new(),
                MemoryKeyCache::new(),
            )),
        }
    }

    pub fn packer(&self) -> &MessagePacker<MemoryDirectory, MemoryKeyCache> {
        &self.packer
    }

    /// Enroll a user: fresh keys, meta, one device-less visa, local keys.
    pub fn enroll_user(&self, name: &str) -> Identifier {
        let sign = SignKeypair::generate();
        let exchange = X25519StaticSecret::generate();
        let id =
            Identifier::named(name, Address::generate(sign.public_key().as_bytes())).unwrap();

        let directory = self.packer.transceiver().directory();
        directory.register_meta(id.clone(), Meta::new(sign.public_key()));
        directory.publish_document(
            id.clone(),
            Visa::new().with_exchange_key(exchange.public_key()),
        );
        directory.add_user(LocalUser {
            id: id.clone(),
            sign_keypair: sign,
            exchange_secret: exchange,
        });
        id
    }

    /// Publish an extra device visa for an enrolled user; returns the
    /// device's exchange secret.
    pub fn enroll_device(&self, id: &Identifier, terminal: &str) -> X25519StaticSecret {
        let exchange = X25519StaticSecret::generate();
        self.packer.transceiver().directory().publish_document(
            id.without_terminal(),
            Visa::new()
                .with_exchange_key(exchange.public_key())
                .with_terminal(terminal),
        );
        exchange
    }

    /// Mint a group identifier (groups have no keys of their own).
    pub fn group_id(&self, name: &str) -> Identifier {
        Identifier::named(name, Address::generate(name.as_bytes())).unwrap()
    }

    pub fn instant(&self, sender: &Identifier, receiver: &Identifier, text: &str) -> InstantMessage {
        InstantMessage::new(
            Envelope::new(sender.clone(), receiver.clone(), TIME),
            Content::text(text),
        )
    }

    pub fn group_instant(&self, sender: &Identifier, group: &Identifier, text: &str) -> InstantMessage {
        InstantMessage::new(
            Envelope::with_group(sender.clone(), group.clone(), TIME, group.clone()),
            Content::text(text).with_group(group.clone()),
        )
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimp::ContentBody;

    #[test]
    fn test_fixture_personal_roundtrip() {
        let fixture = TestFixture::new();
        let alice = fixture.enroll_user("alice");
        let bob = fixture.enroll_user("bob");

        let msg = fixture.instant(&alice, &bob, "hi");
        let reliable = fixture.packer().pack(&msg, None).unwrap().unwrap();
        let opened = fixture.packer().unpack(&reliable, &bob).unwrap().unwrap();

        assert!(matches!(&opened.content.body, ContentBody::Text { text } if text == "hi"));
    }

    #[test]
    fn test_fixture_group_roundtrip() {
        let fixture = TestFixture::new();
        let alice = fixture.enroll_user("alice");
        let bob = fixture.enroll_user("bob");
        let carol = fixture.enroll_user("carol");
        let group = fixture.group_id("club");

        let msg = fixture.group_instant(&alice, &group, "hello group");
        let members = vec![bob.clone(), carol.clone()];
        let reliable = fixture.packer().pack(&msg, Some(&members)).unwrap().unwrap();

        for member in [&bob, &carol] {
            let opened = fixture.packer().unpack(&reliable, member).unwrap().unwrap();
            assert_eq!(opened.content, msg.content);
        }
    }

    #[test]
    fn test_enrolled_devices_fan_out() {
        let fixture = TestFixture::new();
        let alice = fixture.enroll_user("alice");
        let bob = fixture.enroll_user("bob");
        fixture.enroll_device(&bob, "phone");

        let msg = fixture.instant(&alice, &bob, "multi");
        let reliable = fixture.packer().pack(&msg, None).unwrap().unwrap();

        // one device-less visa plus one phone visa: two wraps in the map
        let keys = reliable.keys.as_ref().unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains_key(&bob.to_string()));
        assert!(keys.contains_key(&format!("{bob}/phone")));
    }
}
