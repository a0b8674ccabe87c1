//! Shared configuration for the provis CLI.
//!
//! TOML profiles, identity-token resolution (env + keyring + plaintext),
//! platform paths for the config and persisted session files, and
//! translation to `provis_core::ConsoleConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use provis_core::{ConsoleConfig, TlsVerification};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "provis";

/// File name of the persisted session inside a profile's data directory.
pub const SESSION_FILE: &str = "session.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no identity token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// `auto`, `always`, or `never`. The terminal counterpart of the
    /// dark-mode toggle.
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Token refresh attempts before the session is dropped.
    #[serde(default = "default_refresh_attempts")]
    pub refresh_attempts: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            refresh_attempts: default_refresh_attempts(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_attempts() -> u32 {
    3
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://provision.example.com/api").
    pub api_url: String,

    /// Entra ID token (plaintext; prefer keyring or env var).
    pub identity_token: Option<String>,

    /// Environment variable name containing the Entra ID token.
    pub identity_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "provis", "provis")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    for part in parts {
        p.push(part);
    }
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "provis", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the persisted session of `profile` lives.
///
/// Each profile gets its own directory so signing in to one backend never
/// clobbers another's session.
pub fn session_path(profile: &str) -> PathBuf {
    let base = project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "provis"]),
        |dirs| dirs.data_dir().to_path_buf(),
    );
    base.join("profiles").join(profile).join(SESSION_FILE)
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. Environment variables prefixed `PROVIS_`
/// override file values; nested keys use `__` (`PROVIS_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PROVIS_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Identity token ──────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/identity-token"),
    )?)
}

/// Resolve the Entra ID token: env var named by the profile, then the
/// system keyring, then plaintext config.
pub fn resolve_identity_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.identity_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref token) = profile.identity_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the Entra ID token for `profile_name` in the system keyring.
pub fn store_identity_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a profile's API URL.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `ConsoleConfig` from a profile and the global defaults.
pub fn profile_to_console_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let url = parse_api_url(&profile.api_url)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ConsoleConfig::new(url);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.refresh_attempts = defaults.refresh_attempts;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "staging".into(),
            Profile {
                api_url: "https://staging.example.com/api".into(),
                timeout: Some(10),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("staging".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_profile_name(), "staging");
        let profile = loaded.profile("staging").unwrap();
        assert_eq!(profile.api_url, "https://staging.example.com/api");
        assert_eq!(profile.timeout, Some(10));
        assert!(matches!(
            loaded.profile("prod"),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_overrides_defaults() {
        let profile = Profile {
            api_url: "https://provision.example.com/api".into(),
            timeout: Some(5),
            ca_cert: Some(PathBuf::from("/etc/ssl/internal.pem")),
            ..Profile::default()
        };
        let cfg = profile_to_console_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(
            cfg.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/internal.pem"))
        );
        assert_eq!(cfg.refresh_attempts, 3);
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            api_url: "https://localhost:8443".into(),
            insecure: Some(true),
            ca_cert: Some(PathBuf::from("/tmp/ca.pem")),
            ..Profile::default()
        };
        let cfg = profile_to_console_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(parse_api_url("ftp://example.com").is_err());
        assert!(parse_api_url("not a url").is_err());
        assert!(parse_api_url("http://localhost:3000/api").is_ok());
    }

    #[test]
    fn plaintext_token_is_last_resort() {
        let profile = Profile {
            api_url: "https://x".into(),
            identity_token: Some("plain".into()),
            identity_token_env: Some("PROVIS_TEST_TOKEN_THAT_IS_NOT_SET".into()),
            ..Profile::default()
        };
        let token = resolve_identity_token(&profile, "test-profile-without-keyring").unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    fn session_file_is_per_profile() {
        let a = session_path("default");
        let b = session_path("staging");
        assert_ne!(a, b);
        assert!(a.ends_with(Path::new("default").join(SESSION_FILE)));
    }
}
