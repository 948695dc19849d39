//! Message envelope.
//!
//! The envelope carries the routing header shared by all three message
//! states. It is immutable once created; every pipeline stage copies it
//! forward unchanged.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Routing header: who sent the message, to whom, and when.
///
/// `group` is present only for group-addressed messages, carrying the group
/// identity while `receiver` may name an individual member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: Identifier,

    pub receiver: Identifier,

    /// Sender-claimed timestamp (Unix milliseconds). Untrusted.
    pub time: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Identifier>,
}

impl Envelope {
    /// Create an envelope for a personal message.
    pub fn new(sender: Identifier, receiver: Identifier, time: i64) -> Self {
        Self {
            sender,
            receiver,
            time,
            group: None,
        }
    }

    /// Create an envelope for a group-addressed message.
    pub fn with_group(
        sender: Identifier,
        receiver: Identifier,
        time: i64,
        group: Identifier,
    ) -> Self {
        Self {
            sender,
            receiver,
            time,
            group: Some(group),
        }
    }

    /// A broadcast message requests no confidentiality: its receiver or its
    /// group is one of the reserved broadcast identities.
    pub fn is_broadcast(&self) -> bool {
        self.receiver.is_broadcast() || self.group.as_ref().is_some_and(Identifier::is_broadcast)
    }
}
