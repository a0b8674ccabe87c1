// ── Runtime connection configuration ──
//
// Describes *how* to reach the backend. Carries connection tuning only and
// never touches disk: the CLI builds a `ConsoleConfig` and hands it in,
// together with the session persistence it wants.

use std::time::Duration;

use provis_api::{RefreshPolicy, TlsMode, TransportConfig};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed staging backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API base URL (e.g., `https://provision.example.com/api`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Token refresh attempts before the session is dropped.
    pub refresh_attempts: u32,
    /// Linear backoff between refresh attempts.
    pub refresh_backoff: Duration,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        let policy = RefreshPolicy::default();
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_attempts: policy.max_attempts,
            refresh_backoff: policy.backoff,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::default()
            .with_timeout(self.timeout)
            .with_tls(tls)
    }

    pub(crate) fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            max_attempts: self.refresh_attempts.max(1),
            backoff: self.refresh_backoff,
        }
    }
}
