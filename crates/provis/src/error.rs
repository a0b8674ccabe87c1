//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use provis_config::ConfigError;
use provis_core::{CoreError, DraftError};

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(provis::connection_failed),
        help(
            "Check the API URL and that the backend is running.\n\
             {reason}\n\
             Self-signed staging backend? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(provis::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(provis::auth_failed),
        help(
            "Check that your Entra ID token is current.\n\
             Store a fresh one with: provis config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("Session expired")]
    #[diagnostic(
        code(provis::session_expired),
        help("Sign in again with: provis auth login")
    )]
    SessionExpired,

    #[error("Not signed in")]
    #[diagnostic(
        code(provis::not_signed_in),
        help(
            "Sign in with: provis auth login\n\
             Or set PROVIS_IDENTITY_TOKEN to sign in automatically."
        )
    )]
    NotSignedIn,

    #[error("No identity token configured for profile '{profile}'")]
    #[diagnostic(
        code(provis::no_credentials),
        help(
            "Pass --identity-token, set PROVIS_IDENTITY_TOKEN,\n\
             or store one with: provis config set-token"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(provis::not_found),
        help("Run: provis {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Rejected by the backend ({code}): {message}")]
    #[diagnostic(code(provis::rejected))]
    Rejected { code: String, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(provis::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("Device renamed to {name}, but the naming counter was not saved")]
    #[diagnostic(
        code(provis::counter_not_saved),
        help(
            "The next suggestion may repeat this name. Record the counter with:\n  \
             provis customers update {customer} --counter {device_type}={counter}\n\
             Cause: {reason}"
        )
    )]
    CounterNotSaved {
        name: String,
        customer: String,
        device_type: String,
        counter: u32,
        reason: String,
    },

    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(code(provis::unsupported), help("{reason}"))]
    Unsupported { operation: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(provis::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(provis::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: provis config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(provis::no_config),
        help(
            "Create a profile with: provis config init\n\
             Or pass --api-url / set PROVIS_API_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(provis::config))]
    Config(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(provis::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(provis::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::SessionExpired
            | Self::NotSignedIn
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::ApiError {
                status: Some(409), ..
            } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn list_command_for(entity_type: &str) -> String {
    match entity_type.to_ascii_lowercase().as_str() {
        "customer" => "customers list".into(),
        "job" => "jobs list".into(),
        "task" => "tasks list".into(),
        "task bundle" | "bundle" => "bundles list".into(),
        _ => "--help".into(),
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::SessionExpired => CliError::SessionExpired,
            CoreError::NotSignedIn => CliError::NotSignedIn,
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type),
                resource_type: entity_type,
                identifier,
            },
            CoreError::ValidationFailed { errors } => {
                let field = errors
                    .iter()
                    .map(|e| e.field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let reason = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                CliError::Validation { field, reason }
            }
            CoreError::Draft(e) => CliError::Validation {
                field: "bundle".into(),
                reason: e.to_string(),
            },
            CoreError::Rejected { code, message } => CliError::Rejected { code, message },
            CoreError::CounterNotSaved {
                name,
                customer_id,
                device_type,
                counter,
                reason,
            } => CliError::CounterNotSaved {
                name,
                customer: customer_id,
                device_type: device_type.to_string(),
                counter,
                reason,
            },
            CoreError::Unsupported { operation, reason } => {
                CliError::Unsupported { operation, reason }
            }
            CoreError::Api { message, status } => CliError::ApiError { status, message },
            CoreError::Config { message } => CliError::Config(message),
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<DraftError> for CliError {
    fn from(err: DraftError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile(name) => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        CliError::Config(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use provis_core::{DeviceType, FieldError};

    use super::*;

    #[test]
    fn exit_codes_follow_categories() {
        assert_eq!(CliError::SessionExpired.exit_code(), exit_code::AUTH);
        assert_eq!(
            CliError::from(CoreError::NotFound {
                entity_type: "Customer".into(),
                identifier: "ACME".into(),
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(CoreError::Rejected {
                code: "DUPLICATE_SHORT_CODE".into(),
                message: "taken".into(),
            })
            .exit_code(),
            exit_code::CONFLICT
        );
        assert_eq!(
            CliError::from(CoreError::Timeout { timeout_secs: 5 }).exit_code(),
            exit_code::TIMEOUT
        );
    }

    #[test]
    fn validation_lists_every_field() {
        let err = CliError::from(CoreError::ValidationFailed {
            errors: vec![
                FieldError {
                    field: "name".into(),
                    message: "is required".into(),
                },
                FieldError {
                    field: "short_code".into(),
                    message: "must be 2 to 8 characters".into(),
                },
            ],
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        let text = err.to_string();
        assert!(text.contains("name, short_code"), "{text}");
    }

    #[test]
    fn unsaved_counter_points_at_manual_fix() {
        let err = CliError::from(CoreError::CounterNotSaved {
            name: "ACME-NB005".into(),
            customer_id: "c1".into(),
            device_type: DeviceType::Nb,
            counter: 5,
            reason: "Server error (HTTP 500)".into(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        let help = Diagnostic::help(&err).unwrap().to_string();
        assert!(help.contains("customers update c1 --counter NB=5"), "{help}");
    }
}
