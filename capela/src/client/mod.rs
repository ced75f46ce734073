//! HTTP client and configuration.

mod auth;
mod http;

pub use auth::AuthInfo;
pub use http::{HttpConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{MessageApi, UserApi};
use crate::chat::ChatSession;
use crate::error::{Error, Result};
use crate::models::User;
use crate::store::EntityStore;
use http::{build_client, into_records, HttpExecutor};

/// Builder for creating a [`CapelaClient`].
#[derive(Debug)]
pub struct CapelaClientBuilder {
    auth: Option<AuthInfo>,
    http_config: HttpConfig,
}

impl Default for CapelaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CapelaClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            auth: None,
            http_config: HttpConfig::default(),
        }
    }

    /// Set the bearer token.
    pub fn auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthInfo::new(token));
        self
    }

    /// Set authentication from AuthInfo.
    pub fn with_auth(mut self, auth: AuthInfo) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the hosted application id.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.http_config.app_id = app_id.into();
        self
    }

    /// Set base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.base_url = url.into();
        self
    }

    /// Set custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http_config.custom_user_agent = Some(ua.into());
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = timeout;
        self
    }

    /// Set read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.read_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CapelaClient> {
        if self.http_config.app_id.is_empty() {
            return Err(Error::InvalidArgument("app_id is required".into()));
        }
        let http_client = build_client(&self.http_config)?;

        Ok(CapelaClient {
            inner: Arc::new(ClientInner {
                http: http_client,
                config: self.http_config,
                auth: self.auth,
            }),
        })
    }
}

/// Internal client state.
pub(crate) struct ClientInner {
    pub http: reqwest::Client,
    pub config: HttpConfig,
    pub auth: Option<AuthInfo>,
}

impl ClientInner {
    fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.token.as_str())
    }

    fn executor(&self) -> HttpExecutor<'_> {
        HttpExecutor::new(&self.http, &self.config)
    }
}

/// Client for the Capela community backend.
///
/// Implements [`EntityStore`], so everything layered on the store
/// abstraction (API groups, [`ChatSession`]) runs over it unchanged.
#[derive(Clone)]
pub struct CapelaClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl CapelaClient {
    /// Create a new client builder.
    pub fn builder() -> CapelaClientBuilder {
        CapelaClientBuilder::new()
    }

    /// Get this client as a shared store handle.
    pub fn store(&self) -> Arc<dyn EntityStore> {
        Arc::new(self.clone())
    }

    /// Get the user API.
    pub fn users(&self) -> UserApi {
        UserApi::new(self.store())
    }

    /// Get the message API.
    pub fn messages(&self) -> MessageApi {
        MessageApi::new(self.store())
    }

    /// Open an interactive chat session for the authenticated user.
    pub async fn chat(&self) -> Result<ChatSession> {
        ChatSession::connect(self.store()).await
    }

    /// Check if the client carries credentials.
    pub fn is_authenticated(&self) -> bool {
        self.inner.auth.is_some()
    }

    /// Get the current authentication info.
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.inner.auth.as_ref()
    }
}

impl std::fmt::Debug for CapelaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapelaClient")
            .field("authenticated", &self.is_authenticated())
            .field("base_url", &self.inner.config.base_url)
            .field("app_id", &self.inner.config.app_id)
            .finish()
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl EntityStore for CapelaClient {
    async fn create(&self, kind: &str, fields: Value) -> Result<Value> {
        self.inner
            .executor()
            .post(
                &format!("entities/{}", kind),
                &fields,
                self.inner.token(),
            )
            .await
    }

    async fn list(&self, kind: &str, sort: Option<&str>, limit: Option<u32>)
        -> Result<Vec<Value>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(sort) = sort {
            query.push(("sort", sort.to_owned()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let body = self
            .inner
            .executor()
            .get(&format!("entities/{}", kind), &query, self.inner.token())
            .await?;
        into_records(body)
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

        let mut query: Vec<(&str, String)> = predicate
            .iter()
            .map(|(k, v)| (k.as_str(), query_value(v)))
            .collect();
        if let Some(sort) = sort {
            query.push(("sort", sort.to_owned()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let body = self
            .inner
            .executor()
            .get(&format!("entities/{}", kind), &query, self.inner.token())
            .await?;
        into_records(body)
    }

    async fn update(&self, kind: &str, id: &str, fields: Value) -> Result<Value> {
        self.inner
            .executor()
            .patch(
                &format!("entities/{}/{}", kind, id),
                &fields,
                self.inner.token(),
            )
            .await
    }

    async fn current_user(&self) -> Result<User> {
        if self.inner.auth.is_none() {
            return Err(Error::NotAuthenticated);
        }
        let body = self
            .inner
            .executor()
            .get("auth/me", &[], self.inner.token())
            .await?;
        serde_json::from_value(body).map_err(Error::Json)
    }
}
