//! Minimal HTTP request/response capability used by the transport.
//!
//! The transport never builds or configures an HTTP stack itself. Callers
//! hand it an [`HttpClient`]; [`ReqwestHttpClient`] covers the common case.

use std::error::Error as StdError;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

#[cfg(feature = "reqwest")]
mod reqwest_client;

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestHttpClient;

/// Header carrying the client identification.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// HTTP status signalling the end of the poll stream.
pub const STATUS_NO_CONTENT: u16 = 204;

/// Request methods used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Long-lived receive request
    Get,
    /// One outbound message per request
    Post,
}

/// A minimal HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a GET request with no headers.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request with no headers or body.
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header by name (case-insensitive).
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A minimal HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The full response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure reported by an [`HttpClient`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HttpError(#[source] Box<dyn StdError + Send + Sync>);

impl HttpError {
    /// Wrap any client error.
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// An async HTTP client able to issue a request and read the whole response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send `request` and return the status and full body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
