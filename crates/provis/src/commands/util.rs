//! Shared helpers for command handlers.

use std::path::Path;
use std::str::FromStr;

use provis_core::{Console, DeviceType, JobStatus};

use crate::cli::{DeviceTypeArg, GlobalOpts, JobStatusArg};
use crate::config::{self, Config};
use crate::error::CliError;

/// Make sure the console holds a validated session.
///
/// A session restored from disk is checked with the backend first. When
/// there is none, or the backend rejects it, the configured identity token
/// is used to sign in again.
pub async fn ensure_session(
    console: &Console,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let restored = console.require_session().is_ok();
    if restored && console.restore().await {
        return Ok(());
    }
    let Ok(token) = config::identity_token(global, cfg) else {
        return Err(if restored {
            CliError::SessionExpired
        } else {
            CliError::NotSignedIn
        });
    };
    tracing::debug!(restored, "signing in with identity token");
    console.sign_in(&token).await?;
    Ok(())
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Print a short status line on stderr unless `--quiet`.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

pub fn device_type(arg: DeviceTypeArg) -> DeviceType {
    match arg {
        DeviceTypeArg::Pc => DeviceType::Pc,
        DeviceTypeArg::Nb => DeviceType::Nb,
        DeviceTypeArg::Tab => DeviceType::Tab,
        DeviceTypeArg::Mac => DeviceType::Mac,
        DeviceTypeArg::Srv => DeviceType::Srv,
        DeviceTypeArg::Div => DeviceType::Div,
    }
}

pub fn job_status(arg: JobStatusArg) -> JobStatus {
    match arg {
        JobStatusArg::Created => JobStatus::Created,
        JobStatusArg::Waiting => JobStatus::Waiting,
        JobStatusArg::Imaging => JobStatus::Imaging,
        JobStatusArg::Configuring => JobStatus::Configuring,
        JobStatusArg::Completed => JobStatus::Completed,
        JobStatusArg::Failed => JobStatus::Failed,
        JobStatusArg::Cancelled => JobStatus::Cancelled,
    }
}

/// Split a `TYPE=VALUE` flag into its device type and raw value.
pub fn parse_typed_pair<'a>(flag: &str, raw: &'a str) -> Result<(DeviceType, &'a str), CliError> {
    let (ty, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: flag.into(),
        reason: format!("expected TYPE=VALUE, got '{raw}'"),
    })?;
    let device_type = DeviceType::from_str(ty.trim()).map_err(|_| CliError::Validation {
        field: flag.into(),
        reason: format!("unknown device type '{ty}' (PC, NB, TAB, MAC, SRV, DIV)"),
    })?;
    Ok((device_type, value.trim()))
}

/// Parse a `FROM:TO` move, converting 1-based positions to indices.
pub fn parse_move(raw: &str) -> Result<(usize, usize), CliError> {
    let invalid = || CliError::Validation {
        field: "move".into(),
        reason: format!("expected FROM:TO with positions starting at 1, got '{raw}'"),
    };
    let (from, to) = raw.split_once(':').ok_or_else(invalid)?;
    let from: usize = from.trim().parse().map_err(|_| invalid())?;
    let to: usize = to.trim().parse().map_err(|_| invalid())?;
    if from == 0 || to == 0 {
        return Err(invalid());
    }
    Ok((from - 1, to - 1))
}

/// Read a script file given with `--install-script` / `--verify-script`.
pub fn read_script(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: "script".into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn typed_pair_parses_case_insensitively() {
        let (ty, value) = parse_typed_pair("counter", "nb=12").unwrap();
        assert_eq!(ty, DeviceType::Nb);
        assert_eq!(value, "12");

        let (ty, value) = parse_typed_pair("ou", "SRV=OU=Servers,DC=acme").unwrap();
        assert_eq!(ty, DeviceType::Srv);
        assert_eq!(value, "OU=Servers,DC=acme");
    }

    #[test]
    fn typed_pair_rejects_unknown_type() {
        assert!(parse_typed_pair("counter", "phone=3").is_err());
        assert!(parse_typed_pair("counter", "nb").is_err());
    }

    #[test]
    fn moves_are_one_based() {
        assert_eq!(parse_move("1:3").unwrap(), (0, 2));
        assert!(parse_move("0:2").is_err());
        assert!(parse_move("2-3").is_err());
    }

    #[test]
    fn confirm_with_yes_skips_prompt() {
        assert!(confirm("Delete everything?", true).unwrap());
    }
}
