//! Transport-level error types covering HTTP, framing and task failures.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use super::http::HttpError;
use crate::protocol;

/// Unified error type for long-polling transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `start` was called on a transport that is not idle.
    #[error("transport already started")]
    AlreadyStarted,

    /// The base URL cannot have path segments appended to it.
    #[error("cannot derive endpoint URLs from {url}")]
    InvalidUrl {
        /// Base URL supplied to `start`.
        url: Url,
    },

    /// Server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// Endpoint that was called.
        url: Url,
        /// HTTP status code received.
        status: u16,
    },

    /// The HTTP client failed to complete a request.
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    /// A poll response body could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::Error),

    /// The application completed its outbound queue with an error.
    #[error("application input faulted: {0}")]
    InputFaulted(#[source] Arc<TransportError>),

    /// A loop task panicked or was aborted.
    #[error("transport task failed: {0}")]
    TaskFailed(String),
}
