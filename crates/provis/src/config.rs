//! CLI configuration: thin wrapper around `provis_config` shared types.
//!
//! Adds the resolution steps that respect `GlobalOpts` flag overrides
//! (--api-url, --identity-token, --session-file, ...).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use provis_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use provis_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names, or `(none)`.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the `ConsoleConfig` for this invocation.
///
/// Flags win over the profile; a missing profile is fine as long as
/// `--api-url` supplies the backend.
pub fn console_config(global: &GlobalOpts, config: &Config) -> Result<ConsoleConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = match (config.profiles.get(&profile_name), &global.api_url) {
        (Some(p), _) => p.clone(),
        (None, Some(_)) => Profile::default(),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let profile = Profile {
        api_url: global.api_url.clone().unwrap_or(profile.api_url),
        ..profile
    };
    let mut console = provis_config::profile_to_console_config(&profile, &config.defaults)?;

    if global.insecure {
        console.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        console.timeout = Duration::from_secs(secs);
    }
    Ok(console)
}

/// Where this invocation's session lives.
pub fn session_file(global: &GlobalOpts, config: &Config) -> PathBuf {
    global
        .session_file
        .clone()
        .unwrap_or_else(|| provis_config::session_path(&active_profile_name(global, config)))
}

/// The Entra ID token: `--identity-token` / env first, then the profile's
/// env var, keyring entry, or plaintext value.
pub fn identity_token(global: &GlobalOpts, config: &Config) -> Result<SecretString, CliError> {
    if let Some(ref token) = global.identity_token {
        return Ok(SecretString::from(token.clone()));
    }
    let profile_name = active_profile_name(global, config);
    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?;
    Ok(provis_config::resolve_identity_token(
        profile,
        &profile_name,
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["provis"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["auth", "status"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str, url: &str) -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            name.into(),
            Profile {
                api_url: url.into(),
                timeout: Some(12),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flag_url_overrides_profile() {
        let cfg = config_with("default", "https://prod.example.com/api");
        let g = global(&["--api-url", "http://localhost:9000/api", "--timeout", "3"]);
        let console = console_config(&g, &cfg).unwrap();
        assert_eq!(console.url.as_str(), "http://localhost:9000/api");
        assert_eq!(console.timeout, Duration::from_secs(3));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let cfg = config_with("default", "https://prod.example.com/api");
        let console = console_config(&global(&[]), &cfg).unwrap();
        assert_eq!(console.url.host_str(), Some("prod.example.com"));
        assert_eq!(console.timeout, Duration::from_secs(12));
        assert_eq!(console.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let cfg = config_with("default", "https://prod.example.com/api");
        let err = console_config(&global(&["--profile", "staging"]), &cfg).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "default"));
    }

    #[test]
    fn missing_config_without_url_is_no_config() {
        let err = console_config(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn session_file_flag_wins() {
        let g = global(&["--session-file", "/tmp/provis-session.json"]);
        assert_eq!(
            session_file(&g, &Config::default()),
            PathBuf::from("/tmp/provis-session.json")
        );
    }

    #[test]
    fn identity_token_flag_needs_no_profile() {
        use secrecy::ExposeSecret;
        let g = global(&["--identity-token", "entra-abc"]);
        let token = identity_token(&g, &Config::default()).unwrap();
        assert_eq!(token.expose_secret(), "entra-abc");
    }
}
