//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Password, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display. Call on an already masked config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "default_profile = \"{}\"", cfg.default_profile_name());
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "refresh_attempts = {}", cfg.defaults.refresh_attempts);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref token) = p.identity_token {
            let _ = writeln!(out, "identity_token = \"{token}\"");
        }
        if let Some(ref env) = p.identity_token_env {
            let _ = writeln!(out, "identity_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn mask_secrets(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.identity_token.is_some() {
            profile.identity_token = Some("****".into());
        }
    }
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<SecretString, CliError> {
    let token = Password::new()
        .with_prompt("Entra ID token")
        .interact()
        .map_err(prompt_err)?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "identity_token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(SecretString::from(token.trim().to_owned()))
}

fn parse_flag<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `config set <key> <value>` to the profile or the global defaults.
fn apply_setting(
    cfg: &mut Config,
    profile_name: &str,
    key: &str,
    value: String,
) -> Result<(), CliError> {
    match key {
        "color" => {
            if !matches!(value.as_str(), "auto" | "always" | "never") {
                return Err(CliError::Validation {
                    field: "color".into(),
                    reason: "must be 'auto', 'always', or 'never'".into(),
                });
            }
            cfg.defaults.color = value;
            return Ok(());
        }
        "output" => {
            if !matches!(
                value.as_str(),
                "table" | "json" | "json-compact" | "yaml" | "plain"
            ) {
                return Err(CliError::Validation {
                    field: "output".into(),
                    reason: "must be one of table, json, json-compact, yaml, plain".into(),
                });
            }
            cfg.defaults.output = value;
            return Ok(());
        }
        "refresh_attempts" | "refresh-attempts" => {
            cfg.defaults.refresh_attempts = parse_flag(key, &value, "a number")?;
            return Ok(());
        }
        _ => {}
    }

    let profile = cfg.profiles.entry(profile_name.into()).or_default();
    match key {
        "api_url" | "api-url" => {
            provis_config::parse_api_url(&value)?;
            profile.api_url = value;
        }
        "identity_token_env" | "identity-token-env" => profile.identity_token_env = Some(value),
        "insecure" => profile.insecure = Some(parse_flag(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_flag(key, &value, "a number (seconds)")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, identity_token_env, \
                     ca_cert, insecure, timeout, color, output, refresh_attempts"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("provis: configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("API base URL")
                .default("https://provision.example.com/api".into())
                .validate_with(|input: &String| {
                    provis_config::parse_api_url(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let choices = &[
                "Store in system keyring (recommended)",
                "Read from an environment variable",
                "Save to config file (plaintext)",
                "Skip (pass --identity-token when signing in)",
            ];
            let selection = Select::new()
                .with_prompt("Where should the Entra ID token come from?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                api_url,
                ..Profile::default()
            };
            match selection {
                0 => {
                    let token = prompt_token()?;
                    provis_config::store_identity_token(&profile_name, &token)?;
                    eprintln!("   ✓ Token stored in system keyring");
                }
                1 => {
                    let var: String = Input::new()
                        .with_prompt("Variable name")
                        .default("PROVIS_ENTRA_TOKEN".into())
                        .interact_text()
                        .map_err(prompt_err)?;
                    profile.identity_token_env = Some(var);
                }
                2 => {
                    use secrecy::ExposeSecret;
                    profile.identity_token = Some(prompt_token()?.expose_secret().to_owned());
                }
                _ => {}
            }

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);
            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: provis auth login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            mask_secrets(&mut cfg);
            let out =
                output::render_single(&global.output, &cfg, format_config, |_| "config".into());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            apply_setting(&mut cfg, &profile_name, &key, value)?;
            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: provis config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }
            let token = prompt_token()?;
            provis_config::store_identity_token(&profile_name, &token)?;
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_writes_profile_keys() {
        let mut cfg = Config::default();
        apply_setting(&mut cfg, "staging", "api_url", "https://staging.example.com/api".into())
            .unwrap();
        apply_setting(&mut cfg, "staging", "timeout", "5".into()).unwrap();
        let p = cfg.profile("staging").unwrap();
        assert_eq!(p.api_url, "https://staging.example.com/api");
        assert_eq!(p.timeout, Some(5));
    }

    #[test]
    fn set_writes_defaults_without_creating_profiles() {
        let mut cfg = Config::default();
        apply_setting(&mut cfg, "default", "color", "never".into()).unwrap();
        assert_eq!(cfg.defaults.color, "never");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut cfg = Config::default();
        assert!(apply_setting(&mut cfg, "d", "api_url", "ftp://x".into()).is_err());
        assert!(apply_setting(&mut cfg, "d", "insecure", "maybe".into()).is_err());
        assert!(apply_setting(&mut cfg, "d", "color", "purple".into()).is_err());
        assert!(apply_setting(&mut cfg, "d", "site", "x".into()).is_err());
    }

    #[test]
    fn show_masks_tokens() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_url: "https://prod.example.com/api".into(),
                identity_token: Some("eyJ-secret".into()),
                ..Profile::default()
            },
        );
        mask_secrets(&mut cfg);
        let text = format_config(&cfg);
        assert!(text.contains("identity_token = \"****\""));
        assert!(!text.contains("eyJ-secret"));
    }
}
