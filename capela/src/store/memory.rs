//! In-memory entity store implementation.
//!
//! Backs the library's own tests and works as a drop-in test double for
//! anything that consumes [`EntityStore`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering as AtomicOrdering},
        RwLock,
    },
};

use super::traits::EntityStore;
use crate::error::{Error, Result};
use crate::models::{kinds, User};

/// In-memory store with per-kind record collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    session: RwLock<Option<User>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user record in the roster.
    pub fn add_user(&self, user: &User) {
        let mut records = self.records.write().unwrap();
        records
            .entry(kinds::USER.to_owned())
            .or_default()
            .push(serde_json::to_value(user).expect("user serializes"));
    }

    /// Establish an authenticated session, registering the user if the
    /// roster does not know them yet.
    pub fn sign_in(&self, user: &User) {
        {
            let records = self.records.read().unwrap();
            let known = records
                .get(kinds::USER)
                .map(|users| {
                    users
                        .iter()
                        .any(|u| u.get("email") == Some(&Value::String(user.email.0.clone())))
                })
                .unwrap_or(false);
            drop(records);
            if !known {
                self.add_user(user);
            }
        }
        *self.session.write().unwrap() = Some(user.clone());
    }

    /// Drop the authenticated session.
    pub fn sign_out(&self) {
        *self.session.write().unwrap() = None;
    }

    fn fresh_id(&self) -> String {
        (self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1).to_string()
    }

    fn matches(record: &Value, predicate: &Map<String, Value>) -> bool {
        predicate.iter().all(|(k, v)| record.get(k) == Some(v))
    }

    fn apply_sort(records: &mut [Value], sort: Option<&str>) {
        let Some(sort) = sort else { return };
        let (key, descending) = match sort.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (sort, false),
        };
        records.sort_by(|a, b| {
            let ord = compare_values(a.get(key), b.get(key));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, kind: &str, fields: Value) -> Result<Value> {
        let creator = self
            .session
            .read()
            .unwrap()
            .as_ref()
            .map(|u| u.email.clone())
            .ok_or(Error::NotAuthenticated)?;

        let mut record = match fields {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "record fields must be an object, got {}",
                    other
                )))
            }
        };
        record.insert("id".into(), Value::String(self.fresh_id()));
        record.insert("created_by".into(), Value::String(creator.0));
        record.insert(
            "created_date".into(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let record = Value::Object(record);
        let mut records = self.records.write().unwrap();
        records
            .entry(kind.to_owned())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list(&self, kind: &str, sort: Option<&str>, limit: Option<u32>)
        -> Result<Vec<Value>> {
        self.filter(kind, Value::Object(Map::new()), sort, limit)
            .await
    }

    async fn filter(
        &self,
        kind: &str,
        predicate: Value,
        sort: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let predicate = match predicate {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "predicate must be an object, got {}",
                    other
                )))
            }
        };

        let records = self.records.read().unwrap();
        let mut matched: Vec<Value> = records
            .get(kind)
            .into_iter()
            .flatten()
            .filter(|r| Self::matches(r, &predicate))
            .cloned()
            .collect();

        Self::apply_sort(&mut matched, sort);
        if let Some(limit) = limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn update(&self, kind: &str, id: &str, fields: Value) -> Result<Value> {
        let patch = match fields {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "update fields must be an object, got {}",
                    other
                )))
            }
        };

        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(kind)
            .and_then(|rs| {
                rs.iter_mut()
                    .find(|r| r.get("id") == Some(&Value::String(id.to_owned())))
            })
            .ok_or_else(|| Error::store(404, format!("no {} record with id {}", kind, id)))?;

        if let Value::Object(map) = record {
            for (k, v) in patch {
                map.insert(k, v);
            }
        }
        Ok(record.clone())
    }

    async fn current_user(&self) -> Result<User> {
        self.session
            .read()
            .unwrap()
            .clone()
            .ok_or(Error::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signed_in_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.sign_in(&User::new("a@x.com", "Ana"));
        store
    }

    #[tokio::test]
    async fn test_create_assigns_store_fields() {
        let store = signed_in_store();
        let record = store
            .create("Message", json!({"receiver_email": "b@x.com", "content": "hi"}))
            .await
            .unwrap();

        assert_eq!(record["created_by"], "a@x.com");
        assert_eq!(record["id"], "1");
        assert!(record.get("created_date").is_some());
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let store = MemoryStore::new();
        let err = store
            .create("Message", json!({"content": "hi"}))
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_filter_equality() {
        let store = signed_in_store();
        store
            .create("Message", json!({"receiver_email": "b@x.com", "content": "one"}))
            .await
            .unwrap();
        store
            .create("Message", json!({"receiver_email": "c@x.com", "content": "two"}))
            .await
            .unwrap();

        let matched = store
            .filter("Message", json!({"receiver_email": "b@x.com"}), None, None)
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["content"], "one");
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = signed_in_store();
        let record = store
            .create("Message", json!({"receiver_email": "b@x.com", "content": "hi", "is_read": false}))
            .await
            .unwrap();
        let id = record["id"].as_str().unwrap();

        let updated = store
            .update("Message", id, json!({"is_read": true}))
            .await
            .unwrap();
        assert_eq!(updated["is_read"], true);
        assert_eq!(updated["content"], "hi");
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = signed_in_store();
        let err = store
            .update("Message", "999", json!({"is_read": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let store = signed_in_store();
        store.add_user(&User::new("c@x.com", "Carla"));
        store.add_user(&User::new("b@x.com", "Bruno"));

        let users = store.list("User", Some("full_name"), None).await.unwrap();
        let names: Vec<&str> = users
            .iter()
            .map(|u| u["full_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);
    }
}
