//! Entity store trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::User;

/// The generic record interface the hosted backend exposes.
///
/// All higher layers (the typed API groups and the chat core) go through
/// this trait, so the remote HTTP client and the in-memory test store are
/// interchangeable.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Create a record of the given kind. The store assigns the id, the
    /// creation timestamp, and the creator identity.
    async fn create(&self, kind: &str, fields: Value) -> Result<Value>;

    /// List records of a kind. `sort` is a field name, with a leading `-`
    /// for descending order.
    async fn list(&self, kind: &str, sort: Option<&str>, limit: Option<u32>)
        -> Result<Vec<Value>>;

    /// List records matching an equality predicate object. No range
    /// queries; every key in `predicate` must match exactly.
    async fn filter(
        &self,
        kind: &str,
        predicate: Value,
        sort: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>>;

    /// Update fields of an existing record by id.
    async fn update(&self, kind: &str, id: &str, fields: Value) -> Result<Value>;

    /// Resolve the authenticated user, or fail with
    /// [`Error::NotAuthenticated`](crate::Error::NotAuthenticated).
    async fn current_user(&self) -> Result<User>;
}

/// Deserialize a batch of raw records into a typed vector, skipping records
/// that do not fit the model. The hosted store is schema-loose; one
/// malformed record must not take down a whole refresh.
pub fn decode_records<T: serde::de::DeserializeOwned>(records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|raw| match serde_json::from_value(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("skipping malformed record: {}", e);
                None
            }
        })
        .collect()
}
