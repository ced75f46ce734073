//! Message API.

use serde_json::json;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{kinds, Email, Message, MessageId};
use crate::store::{decode_records, EntityStore};

/// API for message entity operations.
pub struct MessageApi {
    store: Arc<dyn EntityStore>,
}

impl MessageApi {
    pub(crate) fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Messages the given user sent.
    pub async fn sent_by(&self, user: &Email) -> Result<Vec<Message>> {
        let records = self
            .store
            .filter(kinds::MESSAGE, json!({"created_by": user}), None, None)
            .await?;
        Ok(decode_records(records))
    }

    /// Messages addressed to the given user.
    pub async fn received_by(&self, user: &Email) -> Result<Vec<Message>> {
        let records = self
            .store
            .filter(kinds::MESSAGE, json!({"receiver_email": user}), None, None)
            .await?;
        Ok(decode_records(records))
    }

    /// Unread messages addressed to the given user, straight from the
    /// store. The badge count uses this rather than any local log so it
    /// reflects server truth even before a full sync.
    pub async fn unread_for(&self, user: &Email) -> Result<Vec<Message>> {
        let records = self
            .store
            .filter(
                kinds::MESSAGE,
                json!({"receiver_email": user, "is_read": false}),
                None,
                None,
            )
            .await?;
        Ok(decode_records(records))
    }

    /// Send a message. The store assigns id, timestamp, and sender.
    pub async fn send(&self, receiver: &Email, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidArgument(
                "Message content cannot be empty".into(),
            ));
        }
        if !receiver.is_valid() {
            return Err(Error::InvalidArgument(format!(
                "Invalid receiver address: {:?}",
                receiver.as_str()
            )));
        }

        let record = self
            .store
            .create(
                kinds::MESSAGE,
                json!({"receiver_email": receiver, "content": content, "is_read": false}),
            )
            .await?;
        serde_json::from_value(record).map_err(Error::Json)
    }

    /// Mark a message read. Only ever writes `true`; the flag is
    /// monotonic and no client operation reverts it.
    pub async fn mark_read(&self, id: &MessageId) -> Result<()> {
        self.store
            .update(kinds::MESSAGE, id.as_str(), json!({"is_read": true}))
            .await?;
        Ok(())
    }
}
