//! Interactive conversation session.

use std::sync::{Arc, RwLock};

use super::aggregate::aggregate;
use super::poll::{PollConfig, PollerGuard};
use super::sync::MessageSynchronizer;
use super::unread::UnreadTracker;
use crate::api::{MessageApi, UserApi};
use crate::error::Result;
use crate::models::{Conversation, Email, Message, User};
use crate::store::EntityStore;

/// The interactive messaging unit for one authenticated user.
///
/// Cheap to clone; clones share the same log, roster, and selection.
/// The session lives for the duration of the authenticated visit: there
/// is no terminal state, deselecting just returns to "nothing selected".
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn EntityStore>,
    current_user: User,
    roster: RwLock<Vec<User>>,
    synchronizer: MessageSynchronizer,
    unread: UnreadTracker,
    selected: RwLock<Option<Email>>,
}

impl ChatSession {
    /// Connect a session over the given store.
    ///
    /// Resolves the authenticated user (an unauthenticated store fails
    /// here with [`Error::NotAuthenticated`](crate::Error::NotAuthenticated),
    /// which the caller routes to its signed-out view), loads the member
    /// roster, and performs the eager first refresh of the message log
    /// and the unread count.
    pub async fn connect(store: Arc<dyn EntityStore>) -> Result<ChatSession> {
        let users = UserApi::new(store.clone());
        let current_user = users.me().await?;
        let roster = users.list().await?;

        let session = ChatSession {
            inner: Arc::new(SessionInner {
                synchronizer: MessageSynchronizer::new(MessageApi::new(store.clone())),
                unread: UnreadTracker::new(MessageApi::new(store.clone())),
                store,
                current_user,
                roster: RwLock::new(roster),
                selected: RwLock::new(None),
            }),
        };
        session.refresh().await;
        session.refresh_unread().await;
        Ok(session)
    }

    /// The authenticated user this session belongs to.
    pub fn current_user(&self) -> &User {
        &self.inner.current_user
    }

    /// The member roster as of the last load.
    pub fn roster(&self) -> Vec<User> {
        self.inner.roster.read().unwrap().clone()
    }

    /// Reload the member roster from the store, picking up newly
    /// registered members.
    pub async fn reload_roster(&self) -> Result<()> {
        let users = UserApi::new(self.inner.store.clone()).list().await?;
        *self.inner.roster.write().unwrap() = users;
        Ok(())
    }

    /// Refresh the message log. Store failures are logged and leave the
    /// previous log in place.
    pub async fn refresh(&self) {
        self.inner
            .synchronizer
            .refresh(&self.inner.current_user)
            .await;
    }

    /// The full synchronized log, ascending by `(created_date, id)`.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.synchronizer.snapshot()
    }

    /// Conversation summaries for the list view, newest exchange first,
    /// message-less roster members after.
    pub fn conversations(&self) -> Vec<Conversation> {
        let messages = self.inner.synchronizer.snapshot();
        let roster = self.inner.roster.read().unwrap();
        aggregate(&messages, &roster, &self.inner.current_user)
    }

    /// The visible thread with a counterpart: the subsequence of the log
    /// exchanged between exactly the current user and `counterpart`, in
    /// ascending time order.
    pub fn thread(&self, counterpart: &Email) -> Vec<Message> {
        let me = &self.inner.current_user.email;
        self.inner
            .synchronizer
            .snapshot()
            .into_iter()
            .filter(|m| m.is_between(me, counterpart))
            .collect()
    }

    /// The currently selected counterpart, if any.
    pub fn selected(&self) -> Option<Email> {
        self.inner.selected.read().unwrap().clone()
    }

    /// Open the conversation with a counterpart.
    ///
    /// Marks the counterpart's whole unread backlog read, one update per
    /// message. The batch is not atomic against the store: a failed
    /// update is logged and skipped, and the message stays unread until a
    /// later open retries it. A refresh follows so the log reflects the
    /// new read states.
    pub async fn select_conversation(&self, counterpart: Email) {
        *self.inner.selected.write().unwrap() = Some(counterpart.clone());

        let me = &self.inner.current_user.email;
        let backlog: Vec<Message> = self
            .inner
            .synchronizer
            .snapshot()
            .into_iter()
            .filter(|m| m.is_unread_from(&counterpart, me))
            .collect();
        if backlog.is_empty() {
            return;
        }

        let api = MessageApi::new(self.inner.store.clone());
        for message in &backlog {
            if let Err(e) = api.mark_read(&message.id).await {
                log::warn!("failed to mark message {} read: {}", message.id, e);
            }
        }
        self.refresh().await;
    }

    /// Return to the no-conversation-selected state.
    pub fn deselect(&self) {
        *self.inner.selected.write().unwrap() = None;
    }

    /// Send a message to the selected counterpart.
    ///
    /// Blank content (after trimming) or a missing selection is silently
    /// dropped with no store mutation. On success the log is refreshed;
    /// the message only becomes visible once the refreshed log includes
    /// it, there is no optimistic append.
    pub async fn send_message(&self, content: &str) -> Result<()> {
        let content = content.trim();
        let Some(counterpart) = self.selected() else {
            return Ok(());
        };
        if content.is_empty() {
            return Ok(());
        }

        MessageApi::new(self.inner.store.clone())
            .send(&counterpart, content)
            .await?;
        self.refresh().await;
        Ok(())
    }

    /// The last computed unread badge count.
    pub fn unread_badge_count(&self) -> usize {
        self.inner.unread.current()
    }

    /// Recount unread messages from the store.
    pub async fn refresh_unread(&self) -> usize {
        self.inner.unread.refresh(&self.inner.current_user).await
    }

    /// Start the two periodic pollers (message sync and unread count)
    /// with default intervals. They stop when the returned guard drops.
    pub fn start_polling(&self) -> PollerGuard {
        self.start_polling_with(PollConfig::default())
    }

    /// Start the pollers with custom intervals.
    pub fn start_polling_with(&self, config: PollConfig) -> PollerGuard {
        PollerGuard::spawn(self.clone(), config)
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("user", &self.inner.current_user.email)
            .field("selected", &self.selected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ana() -> User {
        User::new("a@x.com", "Ana")
    }

    fn bruno() -> User {
        User::new("b@x.com", "Bruno")
    }

    /// Store with Ana signed in, Bruno and Carla on the roster.
    fn community() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_user(&bruno());
        store.add_user(&User::new("c@x.com", "Carla"));
        store.sign_in(&ana());
        store
    }

    async fn send_as(store: &Arc<MemoryStore>, from: &User, to: &str, content: &str) {
        let me = store.current_user().await.unwrap();
        store.sign_in(from);
        MessageApi::new(store.clone() as Arc<dyn EntityStore>)
            .send(&to.into(), content)
            .await
            .unwrap();
        store.sign_in(&me);
    }

    #[tokio::test]
    async fn test_connect_requires_authentication() {
        let store = Arc::new(MemoryStore::new());
        let err = ChatSession::connect(store).await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_connect_loads_roster_and_log() {
        let store = community();
        send_as(&store, &bruno(), "a@x.com", "oi Ana").await;

        let session = ChatSession::connect(store).await.unwrap();
        assert_eq!(session.current_user().email.as_str(), "a@x.com");
        assert_eq!(session.roster().len(), 3);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.unread_badge_count(), 1);
    }

    #[tokio::test]
    async fn test_select_marks_backlog_read() {
        // Scenario: two unread messages from Bruno exist when Ana opens
        // the conversation.
        let store = community();
        send_as(&store, &bruno(), "a@x.com", "first").await;
        send_as(&store, &bruno(), "a@x.com", "second").await;

        let session = ChatSession::connect(store.clone()).await.unwrap();
        assert_eq!(session.refresh_unread().await, 2);

        session.select_conversation("b@x.com".into()).await;
        assert_eq!(session.selected(), Some("b@x.com".into()));

        // Both updates landed and the refreshed log reflects them.
        assert!(session.messages().iter().all(|m| m.is_read));
        assert_eq!(session.refresh_unread().await, 0);

        // Re-opening is a no-op: nothing left unread, nothing reverted.
        session.select_conversation("b@x.com".into()).await;
        assert!(session.messages().iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn test_partial_mark_read_self_heals() {
        use crate::error::{Error, Result as CapelaResult};
        use async_trait::async_trait;
        use serde_json::Value;

        /// Store whose `update` fails for one configured record id.
        struct StickyUpdateStore {
            inner: MemoryStore,
            failing_id: RwLock<Option<String>>,
        }

        #[async_trait]
        impl EntityStore for StickyUpdateStore {
            async fn create(&self, kind: &str, fields: Value) -> CapelaResult<Value> {
                self.inner.create(kind, fields).await
            }

            async fn list(&self, kind: &str, sort: Option<&str>, limit: Option<u32>)
                -> CapelaResult<Vec<Value>> {
                self.inner.list(kind, sort, limit).await
            }

            async fn filter(
                &self,
                kind: &str,
                predicate: Value,
                sort: Option<&str>,
                limit: Option<u32>,
            ) -> CapelaResult<Vec<Value>> {
                self.inner.filter(kind, predicate, sort, limit).await
            }

            async fn update(&self, kind: &str, id: &str, fields: Value) -> CapelaResult<Value> {
                if self.failing_id.read().unwrap().as_deref() == Some(id) {
                    return Err(Error::store(503, "store unavailable"));
                }
                self.inner.update(kind, id, fields).await
            }

            async fn current_user(&self) -> CapelaResult<User> {
                self.inner.current_user().await
            }
        }

        let store = Arc::new(StickyUpdateStore {
            inner: MemoryStore::new(),
            failing_id: RwLock::new(None),
        });
        store.inner.add_user(&ana());
        store.inner.sign_in(&bruno());

        let api = MessageApi::new(store.clone() as Arc<dyn EntityStore>);
        let first = api.send(&"a@x.com".into(), "first").await.unwrap();
        api.send(&"a@x.com".into(), "second").await.unwrap();
        store.inner.sign_in(&ana());

        // The first message's update will fail mid-batch.
        *store.failing_id.write().unwrap() = Some(first.id.0.clone());

        let session = ChatSession::connect(store.clone()).await.unwrap();
        assert_eq!(session.refresh_unread().await, 2);

        session.select_conversation("b@x.com".into()).await;

        // One update landed; the failed one is left unread rather than
        // rolling back the batch.
        assert_eq!(session.refresh_unread().await, 1);
        let unread: Vec<_> = session
            .messages()
            .into_iter()
            .filter(|m| !m.is_read)
            .collect();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, first.id);

        // Once the store recovers, a later open picks the leftover up.
        *store.failing_id.write().unwrap() = None;
        session.select_conversation("b@x.com".into()).await;
        assert_eq!(session.refresh_unread().await, 0);
        assert!(session.messages().iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn test_blank_send_mutates_nothing() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();
        session.select_conversation("b@x.com".into()).await;

        session.send_message("").await.unwrap();
        session.send_message("   ").await.unwrap();
        assert!(session.messages().is_empty());
        assert!(store
            .filter("Message", serde_json::json!({}), None, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_send_without_selection_is_dropped() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();

        session.send_message("hello?").await.unwrap();
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_visible_after_refresh() {
        let store = community();
        let session = ChatSession::connect(store).await.unwrap();

        session.select_conversation("b@x.com".into()).await;
        session.send_message("  oi Bruno  ").await.unwrap();

        let thread = session.thread(&"b@x.com".into());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].content, "oi Bruno");
        assert_eq!(thread[0].sender.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_thread_filters_pair() {
        let store = community();
        send_as(&store, &bruno(), "a@x.com", "from bruno").await;
        send_as(&store, &User::new("c@x.com", "Carla"), "a@x.com", "from carla").await;

        let session = ChatSession::connect(store).await.unwrap();
        session.select_conversation("b@x.com".into()).await;
        session.send_message("to bruno").await.unwrap();

        let thread = session.thread(&"b@x.com".into());
        let contents: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["from bruno", "to bruno"]);
    }

    #[tokio::test]
    async fn test_conversations_view() {
        let store = community();
        send_as(&store, &bruno(), "a@x.com", "oi").await;

        let session = ChatSession::connect(store).await.unwrap();
        let conversations = session.conversations();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].counterpart.as_str(), "b@x.com");
        assert_eq!(conversations[0].unread_count, 1);
        assert_eq!(conversations[1].counterpart.as_str(), "c@x.com");
        assert!(conversations[1].last_message.is_none());
    }

    #[tokio::test]
    async fn test_deselect() {
        let store = community();
        let session = ChatSession::connect(store).await.unwrap();

        session.select_conversation("b@x.com".into()).await;
        session.deselect();
        assert_eq!(session.selected(), None);

        // With nothing selected a send is silently dropped again.
        session.send_message("lost").await.unwrap();
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_reload_roster() {
        let store = community();
        let session = ChatSession::connect(store.clone()).await.unwrap();
        assert_eq!(session.roster().len(), 3);

        store.add_user(&User::new("d@x.com", "Davi"));
        session.reload_roster().await.unwrap();
        assert_eq!(session.roster().len(), 4);
        assert_eq!(session.conversations().len(), 3);
    }
}
