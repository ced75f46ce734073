//! Authentication state management.

/// Bearer-token credentials for the hosted backend.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    /// Access token.
    pub token: String,
}

impl AuthInfo {
    /// Create new auth info.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Check if auth looks valid.
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty()
    }
}
