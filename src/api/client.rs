//! HostPilot REST API client
//!
//! This module provides the network boundary of the cache: a `Fetcher` trait
//! resolving a resource key to a JSON body, and `ApiClient`, the reqwest-backed
//! implementation that talks to the application's own API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Default base URL of the API when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Name of the session cookie sent with every request
const SESSION_COOKIE: &str = "connect.sid";

/// Errors that can occur when fetching a resource
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status
    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        /// `message` or `error` field of a JSON error body, if any
        message: Option<String>,
    },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not valid JSON for the expected shape
    #[error("Failed to parse response body: {0}")]
    Parse(String),
}

impl FetchError {
    /// HTTP status code, when the failure came from the server
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds an HTTP error from a status and optional JSON error body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        FetchError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Resolves a cache key to a fresh JSON body
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Value, FetchError>;
}

/// Adapts an async closure into a `Fetcher`
pub struct FnFetcher<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Fetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    async fn fetch(&self, key: &str) -> Result<Value, FetchError> {
        (self.f)(key.to_string()).await
    }
}

/// Wraps `f` as a shareable fetcher
///
/// ```ignore
/// let fetcher = fetch_fn(|key| async move { Ok(json!({ "key": key })) });
/// ```
pub fn fetch_fn<F, Fut>(f: F) -> Arc<dyn Fetcher>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    Arc::new(FnFetcher { f })
}

/// Client for the HostPilot REST API
///
/// Issues plain GETs against `base_url + key`. Cookies are kept between
/// requests and an optional session cookie is attached up front.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Self::build_client(None)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client that sends `session` as the session cookie
    pub fn with_session(
        base_url: impl Into<String>,
        session: &str,
    ) -> Result<Self, FetchError> {
        let client = Self::build_client(Some(session))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_client(session: Option<&str>) -> Result<Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(session) = session {
            let cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, session))
                .map_err(|e| FetchError::Transport(format!("invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, cookie);
        }

        Ok(Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?)
    }

    /// The base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a resource key
    pub fn url_for(&self, key: &str) -> String {
        if key.starts_with("http://") || key.starts_with("https://") {
            return key.to_string();
        }
        if key.starts_with('/') {
            format!("{}{}", self.base_url, key)
        } else {
            format!("{}/{}", self.base_url, key)
        }
    }
}

#[async_trait]
impl Fetcher for ApiClient {
    async fn fetch(&self, key: &str) -> Result<Value, FetchError> {
        let url = self.url_for(key);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::from_status(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
