// ── Core error types ──
//
// User-facing errors from provis-core. Consumers never see raw HTTP
// plumbing; `From<provis_api::Error>` translates transport-layer errors
// into domain-appropriate variants.

use std::fmt;

use thiserror::Error;

use provis_api::DeviceType;

use crate::bundle::DraftError;

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- sign in again")]
    SessionExpired,

    #[error("Not signed in")]
    NotSignedIn,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Validation failed: {}", join_fields(.errors))]
    ValidationFailed { errors: Vec<FieldError> },

    #[error(transparent)]
    Draft(#[from] DraftError),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The device rename went through but the customer's naming counter
    /// update did not.
    #[error("Device renamed to {name}, but the naming counter was not saved: {reason}")]
    CounterNotSaved {
        name: String,
        customer_id: String,
        device_type: DeviceType,
        counter: u32,
        reason: String,
    },

    #[error("Operation not supported: {operation} ({reason})")]
    Unsupported { operation: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub(crate) fn not_found(entity_type: &str, identifier: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<provis_api::Error> for CoreError {
    fn from(err: provis_api::Error) -> Self {
        match err {
            provis_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            provis_api::Error::SessionExpired => CoreError::SessionExpired,
            provis_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            provis_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            provis_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            provis_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            provis_api::Error::Api {
                status: 404,
                message,
                ..
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            provis_api::Error::Api {
                code: Some(code),
                message,
                ..
            } => CoreError::Rejected { code, message },
            provis_api::Error::Api {
                status, message, ..
            } => CoreError::Api {
                message,
                status: Some(status),
            },
            provis_api::Error::Server { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            provis_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            provis_api::Error::InvalidUpload(reason) => CoreError::validation("file", reason),
            provis_api::Error::Storage(message) => CoreError::Config { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_keeps_the_configured_limit() {
        let err = CoreError::from(provis_api::Error::Timeout { timeout_secs: 30 });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn coded_client_error_is_a_rejection() {
        let err = CoreError::from(provis_api::Error::Api {
            status: 409,
            code: Some("DUPLICATE_SHORT_CODE".into()),
            message: "taken".into(),
        });
        assert!(matches!(err, CoreError::Rejected { ref code, .. } if code == "DUPLICATE_SHORT_CODE"));
    }
}
