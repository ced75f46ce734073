//! Message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, MessageId};

/// One directed message between two members.
///
/// The store assigns `id`, `created_date`, and the sender (persisted under
/// the wire name `created_by`, taken from the authenticated session).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier.
    pub id: MessageId,
    /// Sender address, assigned by the store at creation.
    #[serde(rename = "created_by")]
    pub sender: Email,
    /// Receiver address.
    pub receiver_email: Email,
    /// Text payload.
    pub content: String,
    /// Creation timestamp, the sole ordering key.
    pub created_date: DateTime<Utc>,
    /// Read flag. False at creation, set to true exactly once by the
    /// receiver, never reverted.
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    /// Resolve the other party of this message relative to `me`.
    ///
    /// Returns `None` for the pathological self-message case, which every
    /// derived view must skip.
    pub fn counterpart(&self, me: &Email) -> Option<&Email> {
        let other = if &self.sender == me {
            &self.receiver_email
        } else {
            &self.sender
        };
        if other == me {
            None
        } else {
            Some(other)
        }
    }

    /// Whether this message was exchanged between exactly `a` and `b`.
    pub fn is_between(&self, a: &Email, b: &Email) -> bool {
        (&self.sender == a && &self.receiver_email == b)
            || (&self.sender == b && &self.receiver_email == a)
    }

    /// Whether this is an unread message addressed to `me` from `from`.
    pub fn is_unread_from(&self, from: &Email, me: &Email) -> bool {
        &self.sender == from && &self.receiver_email == me && !self.is_read
    }

    /// Ascending ordering key: timestamp first, id as the deterministic
    /// tie-break.
    pub fn sort_key(&self) -> (DateTime<Utc>, &MessageId) {
        (self.created_date, &self.id)
    }
}
