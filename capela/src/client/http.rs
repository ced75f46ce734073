//! HTTP client configuration and request execution.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.base44.com/api/";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("capela/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for API requests.
    pub base_url: String,
    /// Hosted application id, part of every entity path.
    pub app_id: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Custom user agent.
    pub custom_user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            app_id: String::new(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(20),
            custom_user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Get the user agent to use.
    pub fn user_agent(&self) -> &str {
        self.custom_user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Resolve an app-scoped API path to a full URL.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(Error::Url);
        }

        Url::parse(&self.base_url)
            .and_then(|b| b.join(&format!("apps/{}/{}", self.app_id, path)))
            .map_err(Error::Url)
    }
}

/// Build a reqwest client with the given configuration.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// HTTP request executor.
pub struct HttpExecutor<'a> {
    client: &'a Client,
    config: &'a HttpConfig,
}

impl<'a> HttpExecutor<'a> {
    /// Create a new executor.
    pub fn new(client: &'a Client, config: &'a HttpConfig) -> Self {
        Self { client, config }
    }

    /// Build a request with common headers.
    fn build_request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("User-Agent", self.config.user_agent())
            .header("Accept", "application/json");

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Execute a GET request and return the decoded JSON body.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<Value> {
        let url = self.config.resolve_url(path)?;
        let request = self.build_request(Method::GET, url, token).query(query);
        let response = request.send().await.map_err(Error::Network)?;
        handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> Result<Value> {
        let url = self.config.resolve_url(path)?;
        let request = self.build_request(Method::POST, url, token).json(body);
        let response = request.send().await.map_err(Error::Network)?;
        handle_response(response).await
    }

    /// Execute a PATCH request with a JSON body.
    pub async fn patch(&self, path: &str, body: &Value, token: Option<&str>) -> Result<Value> {
        let url = self.config.resolve_url(path)?;
        let request = self.build_request(Method::PATCH, url, token).json(body);
        let response = request.send().await.map_err(Error::Network)?;
        handle_response(response).await
    }
}

/// Decode a response, mapping the store's error envelope onto [`Error`].
async fn handle_response(response: Response) -> Result<Value> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(Error::Network)?;

    if !status.is_success() {
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::NotAuthenticated);
        }
        let message = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_owned()
            });
        return Err(Error::store(status.as_u16(), message));
    }

    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(Error::Json)
}

/// Unwrap a list response: a bare array, an object carrying a `results`
/// array, or an empty body (null) for an empty collection.
pub fn into_records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(Error::Internal("expected a record array".into())),
        },
        other => Err(Error::Internal(format!(
            "expected a record array, got {}",
            other
        ))),
    }
}
