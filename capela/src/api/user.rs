//! User API.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{kinds, User};
use crate::store::{decode_records, EntityStore};

/// API for member roster and session operations.
pub struct UserApi {
    store: Arc<dyn EntityStore>,
}

impl UserApi {
    pub(crate) fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Resolve the authenticated user.
    pub async fn me(&self) -> Result<User> {
        self.store.current_user().await
    }

    /// Get the full member roster, sorted by display name.
    pub async fn list(&self) -> Result<Vec<User>> {
        let records = self.store.list(kinds::USER, Some("full_name"), None).await?;
        Ok(decode_records(records))
    }

    /// Find members whose display name contains `term`, case-insensitively.
    /// The store only supports equality filters, so this narrows
    /// client-side.
    pub async fn search(&self, term: &str) -> Result<Vec<User>> {
        let mut users = self.list().await?;
        users.retain(|u| u.name_matches(term));
        Ok(users)
    }
}
