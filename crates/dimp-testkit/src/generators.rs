//! Proptest generators for property-based testing.

use proptest::prelude::*;

use dimp_core::{Address, Content, ContentBody, Identifier};
use dimp_keyring::EncryptedBundle;

/// Generate an entity name.
pub fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,11}".prop_map(String::from)
}

/// Generate an opaque address fingerprint.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 16]>().prop_map(|seed| Address::generate(&seed))
}

/// Generate a terminal label.
pub fn terminal() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}".prop_map(String::from)
}

/// Generate an identifier, with or without a terminal.
pub fn identifier() -> impl Strategy<Value = Identifier> {
    (name(), address(), prop::option::of(terminal())).prop_map(|(name, address, terminal)| {
        Identifier::new(Some(&name), address, terminal.as_deref()).unwrap()
    })
}

/// Generate printable message text.
pub fn message_text() -> impl Strategy<Value = String> {
    "[ -~]{0,64}".prop_map(String::from)
}

/// Generate content across the closed kinds.
pub fn content() -> impl Strategy<Value = Content> {
    prop_oneof![
        message_text().prop_map(|text| Content::new(ContentBody::Text { text })),
        ("[a-z]{1,12}\\.[a-z]{1,4}", prop::option::of("https?://[a-z]{3,10}\\.example"))
            .prop_map(|(filename, url)| Content::new(ContentBody::File { filename, url })),
    ]
}

/// Generate a bundle with 1..=4 distinct terminals.
pub fn bundle() -> impl Strategy<Value = EncryptedBundle> {
    prop::collection::btree_map(terminal(), prop::collection::vec(any::<u8>(), 1..64), 1..=4)
        .prop_map(|entries| {
            let mut bundle = EncryptedBundle::new();
            for (terminal, data) in entries {
                bundle.put(&terminal, data);
            }
            bundle
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFixture;

    proptest! {
        #[test]
        fn test_identifier_display_parse_roundtrip(id in identifier()) {
            let parsed: Identifier = id.to_string().parse().unwrap();
            prop_assert_eq!(&parsed, &id);
            prop_assert_eq!(parsed.terminal(), id.terminal());
        }

        #[test]
        fn test_content_codec_roundtrip(content in content()) {
            let bytes = serde_json::to_vec(&content).unwrap();
            let back: Content = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(back, content);
        }

        #[test]
        fn test_bundle_encode_decode_roundtrip(bundle in bundle(), id in identifier()) {
            let id = id.without_terminal();
            let terminals: Vec<String> =
                bundle.terminals().map(str::to_string).collect();

            let wire = bundle.encode(&id).unwrap();
            let back = EncryptedBundle::decode(&wire, &id, &terminals).unwrap();
            prop_assert_eq!(back, bundle);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_pipeline_roundtrip_any_text(text in message_text()) {
            let fixture = TestFixture::new();
            let alice = fixture.enroll_user("alice");
            let bob = fixture.enroll_user("bob");

            let msg = fixture.instant(&alice, &bob, &text);
            let reliable = fixture.packer().pack(&msg, None).unwrap().unwrap();
            let opened = fixture.packer().unpack(&reliable, &bob).unwrap().unwrap();
            prop_assert_eq!(opened.content, msg.content);
        }
    }
}
