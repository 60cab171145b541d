//! Error types for the Outline management API client.
//!
//! # Design
//! Every failure surfaces to the immediate caller as one `ApiError`; nothing
//! in the stack retries or recovers locally. Variants follow the stage that
//! failed: composing the URL (`Template`), decoding input or output
//! (`Parse`, `Serialization`, `Config`), moving bytes (`Network`, `Timeout`,
//! `Transport`), judging the server's answer (`Server`), or scheduling the
//! call (`Executor`). Errors from the HTTP library stay attached as the
//! `source` so callers can still inspect them.

use thiserror::Error;

/// Errors returned by the Outline client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path template could not be fully resolved or appended to the base URL.
    #[error("template error: {0}")]
    Template(String),

    /// Malformed input URL or malformed response JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Client configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// DNS resolution, TCP connect or TLS handshake failed.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The exchange did not finish within the configured timeout.
    #[error("timeout error: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The server answered with an unexpected status or an unexpected shape.
    #[error("server error: {message} (status={status})")]
    Server { status: u16, message: String },

    /// Any other failure reported by the HTTP library.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The call could not be scheduled on, or completed by, the executor.
    #[error("executor error: {0}")]
    Executor(String),
}

impl ApiError {
    /// HTTP status observed by the server check, if this is a `Server` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify an error from the HTTP library.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err)
        } else if err.is_connect() {
            ApiError::Network(err)
        } else {
            ApiError::Transport(err)
        }
    }
}
