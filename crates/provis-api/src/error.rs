use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `provis-api` crate.
///
/// Covers every failure mode of the backend client: authentication,
/// transport, structured application errors, server errors, and decoding.
/// `provis-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or token validation failed.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session token was rejected and could not be refreshed.
    #[error("Session expired -- sign in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    /// Timeouts seen by [`ApiClient`](crate::ApiClient) arrive as
    /// [`Error::Timeout`] instead.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response below 500. `code` is set when the body carried an
    /// application error code.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// 5xx response from the backend.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Task content rejected before upload.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Session persistence could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns `true` if the session is gone and signing in again might
    /// resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            Self::Timeout { .. } | Self::Server { .. } => true,
            _ => false,
        }
    }

    /// Classify a reqwest failure, splitting out timeouts. `timeout` is the
    /// limit the client was built with.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_secs: timeout.as_secs().max(1),
            }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the application error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the client already raised the generic error
    /// notification for this failure.
    pub fn raised_generic_notification(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::InvalidUrl(_)
                | Self::Timeout { .. }
                | Self::Tls(_)
                | Self::Server { .. }
                | Self::Api { code: None, .. }
        )
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
