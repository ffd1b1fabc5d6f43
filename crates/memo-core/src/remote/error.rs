//! Remote transport errors

use reqwest::{Method, StatusCode};
use thiserror::Error;

use super::retry::Retryable;

/// Result type alias for remote operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Errors returned by a [`RemoteTransport`](super::RemoteTransport).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server rejected the configured credentials (HTTP 401)
    #[error("WebDAV authentication failed for {path}")]
    Authentication { path: String },

    /// Connection failure, timeout or interrupted body
    #[error("WebDAV {method} {path} failed: {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },

    /// HTTP 5xx
    #[error("WebDAV server error {status} for {method} {path}")]
    Server {
        method: String,
        path: String,
        status: u16,
    },

    /// Any other unexpected HTTP status (4xx other than 401)
    #[error("WebDAV {method} {path} returned HTTP {status}")]
    Status {
        method: String,
        path: String,
        status: u16,
    },

    /// The server answered with something we could not interpret
    #[error("Invalid WebDAV response for {path}: {message}")]
    InvalidResponse { path: String, message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl RemoteError {
    pub(crate) fn transport(method: &Method, path: &str, error: &reqwest::Error) -> Self {
        Self::Transport {
            method: method.to_string(),
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn from_status(method: &Method, path: &str, status: StatusCode) -> Self {
        let method = method.to_string();
        let path = path.to_string();
        let status = status.as_u16();
        match status {
            401 => Self::Authentication { path },
            500..=599 => Self::Server {
                method,
                path,
                status,
            },
            _ => Self::Status {
                method,
                path,
                status,
            },
        }
    }

    /// HTTP status carried by the error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Server { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote resource does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Whether the credentials were rejected.
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

impl Retryable for RemoteError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Server { .. })
    }
}
