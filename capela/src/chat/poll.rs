//! Periodic polling bound to the session lifetime.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::session::ChatSession;

/// Polling intervals for the two background tasks.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Message log refresh interval.
    pub sync_interval: Duration,
    /// Unread badge recount interval.
    pub unread_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(5),
            unread_interval: Duration::from_secs(10),
        }
    }
}

/// Owns the two poller tasks of a session.
///
/// Dropping the guard aborts both tasks, so a poller can never outlive
/// the scope that started it. A tick whose store call runs long simply
/// finishes late; the next tick is delayed rather than piled up, and
/// in-flight calls are not cancelled mid-request by the schedule.
pub struct PollerGuard {
    sync_task: JoinHandle<()>,
    unread_task: JoinHandle<()>,
}

impl PollerGuard {
    pub(crate) fn spawn(session: ChatSession, config: PollConfig) -> Self {
        let sync_session = session.clone();
        let sync_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.sync_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The session already did its eager refresh on connect; skip
            // the immediate first tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sync_session.refresh().await;
            }
        });

        let unread_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.unread_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                session.refresh_unread().await;
            }
        });

        Self {
            sync_task,
            unread_task,
        }
    }

    /// Whether both tasks are still scheduled.
    pub fn is_running(&self) -> bool {
        !self.sync_task.is_finished() && !self.unread_task.is_finished()
    }

    /// Stop both pollers now. Equivalent to dropping the guard.
    pub fn shutdown(self) {}
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.sync_task.abort();
        self.unread_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageApi;
    use crate::models::User;
    use crate::store::{EntityStore, MemoryStore};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn community() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_user(&User::new("b@x.com", "Bruno"));
        store.sign_in(&User::new("a@x.com", "Ana"));
        store
    }

    async fn bruno_sends(store: &Arc<MemoryStore>, content: &str) {
        let me = store.current_user().await.unwrap();
        store.sign_in(&User::new("b@x.com", "Bruno"));
        MessageApi::new(store.clone() as Arc<dyn EntityStore>)
            .send(&"a@x.com".into(), content)
            .await
            .unwrap();
        store.sign_in(&me);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pollers_pick_up_new_messages() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();
        let guard = session.start_polling();
        assert!(guard.is_running());

        bruno_sends(&store, "oi").await;
        assert!(session.messages().is_empty());
        assert_eq!(session.unread_badge_count(), 0);

        // One sync tick in.
        sleep(Duration::from_secs(6)).await;
        assert_eq!(session.messages().len(), 1);

        // The unread poller runs at half the cadence.
        sleep(Duration::from_secs(6)).await;
        assert_eq!(session.unread_badge_count(), 1);

        guard.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_guard_stops_polling() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();
        let guard = session.start_polling();

        bruno_sends(&store, "first").await;
        sleep(Duration::from_secs(12)).await;
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.unread_badge_count(), 1);

        drop(guard);

        bruno_sends(&store, "second").await;
        sleep(Duration::from_secs(30)).await;
        // No timer survived the guard.
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.unread_badge_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_intervals() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();
        let _guard = session.start_polling_with(PollConfig {
            sync_interval: Duration::from_millis(100),
            unread_interval: Duration::from_millis(100),
        });

        bruno_sends(&store, "quick").await;
        sleep(Duration::from_millis(250)).await;
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.unread_badge_count(), 1);
    }
}
