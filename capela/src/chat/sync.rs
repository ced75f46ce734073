//! Message log synchronization.

use std::sync::RwLock;

use crate::api::MessageApi;
use crate::models::{Message, User};

/// Keeps the in-memory message log consistent with the store.
///
/// Each refresh issues two filtered reads (messages the user sent,
/// messages the user received), concatenates them, and replaces the log
/// wholesale with the union sorted ascending by `(created_date, id)`. The
/// two filters are disjoint by the no-self-message invariant, so no
/// deduplication is needed. A failed read keeps the previous log intact.
pub struct MessageSynchronizer {
    api: MessageApi,
    log: RwLock<Vec<Message>>,
}

impl MessageSynchronizer {
    pub(crate) fn new(api: MessageApi) -> Self {
        Self {
            api,
            log: RwLock::new(Vec::new()),
        }
    }

    /// Refresh the log for the given user and return the new ordered
    /// sequence. On a store failure the previous log is returned
    /// unchanged; the error is logged, never raised, and the next
    /// scheduled tick is the retry.
    pub async fn refresh(&self, user: &User) -> Vec<Message> {
        let sent = self.api.sent_by(&user.email).await;
        let received = self.api.received_by(&user.email).await;

        match (sent, received) {
            (Ok(mut merged), Ok(received)) => {
                merged.extend(received);
                merged.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
                *self.log.write().unwrap() = merged.clone();
                merged
            }
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("message refresh failed, keeping previous log: {}", e);
                self.snapshot()
            }
        }
    }

    /// The current log, ascending by `(created_date, id)`.
    pub fn snapshot(&self) -> Vec<Message> {
        self.log.read().unwrap().clone()
    }
}
