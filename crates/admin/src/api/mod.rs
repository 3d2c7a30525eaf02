//! Store REST API client.
//!
//! Every resource the dashboard manages lives behind this API. Calls other
//! than login carry the signed-in admin's bearer token.
//!
//! # Endpoints
//!
//! - `auth`: `POST /auth/admin/login`
//! - `products`: list, create (multipart), update, replace images, delete
//! - `orders`: list, create, set delivery/payment status, delete
//! - `users`: list, profile read/update, delete

mod auth;
mod orders;
mod products;
mod users;

pub use auth::LoginSession;
pub use products::Upload;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when calling the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected or token expired (401/403).
    #[error("Unauthorized{}", suffix(.0.as_deref()))]
    Unauthorized(Option<String>),

    /// Resource not found (404).
    #[error("Not found{}", suffix(.0.as_deref()))]
    NotFound(Option<String>),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// API returned another error response.
    #[error("API error: {status}{}", suffix(.message.as_deref()))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

fn suffix(message: Option<&str>) -> String {
    message.map(|m| format!(" - {m}")).unwrap_or_default()
}

impl ApiError {
    /// The message the API sent with the failure, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) => message.as_deref(),
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Toast text: the server's message when present, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_owned()
    }

    /// Whether the bearer token is no longer accepted.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// The `message` field most error bodies carry.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Store API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storedesk-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Check that the API answers at all.
    ///
    /// Any HTTP response counts, since the base URL itself need not be a
    /// route.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the API cannot be reached.
    pub async fn ping(&self) -> Result<StatusCode, ApiError> {
        let response = self
            .inner
            .client
            .get(self.inner.base_url.clone())
            .send()
            .await?;
        Ok(response.status())
    }

    /// Endpoint URL under the base, one path segment per entry.
    ///
    /// Segments are percent-encoded, so an id cannot add path levels, a
    /// query or a fragment. Empty, `.` and `..` segments are refused.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(ApiError::Parse(format!("Invalid path segment '{bad}'")));
        }
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Parse("API base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    /// Start a request, attaching the bearer token when one is given.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let mut builder = self.inner.client.request(method, self.url(segments)?);
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Parse(format!("Invalid token format: {e}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    /// Execute a request and parse a JSON success body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Execute a request whose success body may be empty.
    ///
    /// Returns the parsed JSON body, or `None` for `204` and empty bodies.
    pub(crate) async fn send_optional_json(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(None);
            }
            let bytes = response.bytes().await?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            return serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Build an error from a non-success response.
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ApiError::RateLimited(retry_after);
        }

        let message = response
            .bytes()
            .await
            .ok()
            .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
            .and_then(|body| body.message.or(body.error))
            .filter(|m| !m.trim().is_empty());

        match status {
            401 | 403 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Api { status, message },
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
