//! Derived conversation summaries.

use serde::{Deserialize, Serialize};

use super::{Email, Message};

/// A per-counterpart conversation summary for the list view.
///
/// Never persisted: rebuilt from scratch by the aggregator on every
/// message-log refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// The other participant's address.
    pub counterpart: Email,
    /// Most recent message exchanged with the counterpart, if any.
    pub last_message: Option<Message>,
    /// Messages from the counterpart addressed to the current user that
    /// are still unread.
    pub unread_count: u32,
}

impl Conversation {
    /// An empty conversation for a roster member with no messages yet.
    pub fn empty(counterpart: impl Into<Email>) -> Self {
        Self {
            counterpart: counterpart.into(),
            last_message: None,
            unread_count: 0,
        }
    }

    /// Whether any message has been exchanged yet.
    pub fn has_messages(&self) -> bool {
        self.last_message.is_some()
    }
}
