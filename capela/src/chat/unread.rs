//! Global unread-count tracking.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::MessageApi;
use crate::models::User;

/// Tracks the signed-in user's total unread-message count for the badge.
///
/// Counts straight from the store rather than the local log, so the badge
/// reflects server truth even before a full sync. The last good count is
/// cached and served when a refresh fails.
pub struct UnreadTracker {
    api: MessageApi,
    last: AtomicUsize,
}

impl UnreadTracker {
    pub(crate) fn new(api: MessageApi) -> Self {
        Self {
            api,
            last: AtomicUsize::new(0),
        }
    }

    /// Recount unread messages for the given user. On a store failure the
    /// cached count is returned and the error is logged; the next tick
    /// retries.
    pub async fn refresh(&self, user: &User) -> usize {
        match self.api.unread_for(&user.email).await {
            Ok(unread) => {
                let count = unread.len();
                self.last.store(count, Ordering::Relaxed);
                count
            }
            Err(e) => {
                log::warn!("unread count refresh failed, keeping last value: {}", e);
                self.current()
            }
        }
    }

    /// The most recently computed count.
    pub fn current(&self) -> usize {
        self.last.load(Ordering::Relaxed)
    }
}
