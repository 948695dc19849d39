//! Typed message content.
//!
//! Content is the application payload carried inside an instant message.
//! The pipeline never inspects it beyond serialization; the kinds form a
//! closed set so unknown payloads are rejected at the codec instead of
//! being routed through a runtime factory registry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// An application payload with its per-session serial number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Serial number, random and process-unique within a session.
    pub sn: u32,

    /// Group this content is addressed to, mirroring the envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Identifier>,

    #[serde(flatten)]
    pub body: ContentBody,
}

/// The closed set of content kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBody {
    /// Plain text message.
    Text { text: String },

    /// File attachment; the data itself travels out of band.
    File {
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },

    /// Application-defined payload.
    App {
        app: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl Content {
    /// Wrap a body with a fresh serial number.
    pub fn new(body: ContentBody) -> Self {
        Self {
            sn: next_serial(),
            group: None,
            body,
        }
    }

    /// Shorthand for a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentBody::Text { text: text.into() })
    }

    /// Attach a group identity to this content.
    pub fn with_group(mut self, group: Identifier) -> Self {
        self.group = Some(group);
        self
    }
}

/// Serial numbers start at a random point and count up; zero is skipped so
/// it can serve as a missing-value sentinel in logs and caches.
fn next_serial() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU32::new(rand::random()));
    loop {
        let sn = counter.fetch_add(1, Ordering::Relaxed);
        if sn != 0 {
            return sn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serials_unique_and_nonzero() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let content = Content::text("x");
            assert_ne!(content.sn, 0);
            assert!(seen.insert(content.sn));
        }
    }

    #[test]
    fn test_wire_shape() {
        let content = Content::text("Hello");
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["sn"], content.sn);
    }

    #[test]
    fn test_codec_roundtrip() {
        let content = Content::new(ContentBody::App {
            app: "poll".into(),
            payload: serde_json::json!({"question": "lunch?", "options": ["yes", "no"]}),
        });
        let bytes = serde_json::to_vec(&content).unwrap();
        let back: Content = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(content, back);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let raw = r#"{"sn": 7, "type": "hologram", "beam": true}"#;
        assert!(serde_json::from_str::<Content>(raw).is_err());
    }
}
