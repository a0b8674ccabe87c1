//! Session command handlers.

use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use provis_core::{Console, RefreshSession, User};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Client")]
    user_agent: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

impl From<&RefreshSession> for SessionRow {
    fn from(s: &RefreshSession) -> Self {
        Self {
            id: s.id.clone(),
            user_agent: output::or_dash(s.user_agent.as_deref()),
            created: output::fmt_time(s.created_at.as_ref()),
            expires: output::fmt_time(s.expires_at.as_ref()),
        }
    }
}

/// What `auth status` reports.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    signed_in: bool,
    api_url: String,
    user: Option<User>,
}

fn status_detail(s: &Status) -> String {
    let mut lines = vec![format!("Backend:  {}", s.api_url)];
    match &s.user {
        Some(u) => {
            lines.push(format!("User:     {} <{}>", u.name, u.email));
            lines.push(format!("User ID:  {}", u.id));
        }
        None => lines.push("User:     (not signed in)".into()),
    }
    lines.join("\n")
}

fn user_detail(u: &User) -> String {
    format!("Signed in as {} <{}>", u.name, u.email)
}

fn prompt_token() -> Result<SecretString, CliError> {
    let token = dialoguer::Password::new()
        .with_prompt("Entra ID token")
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "identity_token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(SecretString::from(token.trim().to_owned()))
}

pub async fn handle(
    console: &Console,
    cfg: &Config,
    args: AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login { prompt, save } => {
            let token = if prompt {
                prompt_token()?
            } else {
                config::identity_token(global, cfg)?
            };
            let user = console.sign_in(&token).await?;
            if save {
                let profile = config::active_profile_name(global, cfg);
                provis_config::store_identity_token(&profile, &token)?;
                util::note(global, &format!("✓ Token stored in keyring for '{profile}'"));
            }
            let out = output::render_single(&global.output, &user, user_detail, |u| u.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Logout => {
            console.sign_out().await;
            util::note(global, "✓ Signed out");
            Ok(())
        }

        AuthCommand::Status => {
            let signed_in = console.require_session().is_ok() && console.restore().await;
            let status = Status {
                signed_in,
                api_url: console.client().base_url().to_string(),
                user: if signed_in { console.session().user() } else { None },
            };
            let out = output::render_single(&global.output, &status, status_detail, |s| {
                s.user.as_ref().map(|u| u.email.clone()).unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            if signed_in {
                Ok(())
            } else {
                Err(CliError::NotSignedIn)
            }
        }

        AuthCommand::Refresh => {
            util::ensure_session(console, cfg, global).await?;
            console.refresh().await?;
            util::note(global, "✓ Session refreshed");
            Ok(())
        }

        AuthCommand::Sessions => {
            util::ensure_session(console, cfg, global).await?;
            let sessions = console.refresh_sessions().await?;
            let out = output::render_list(
                &global.output,
                &sessions,
                |s| SessionRow::from(s),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Revoke { id } => {
            util::ensure_session(console, cfg, global).await?;
            if !util::confirm(&format!("Revoke session {id}?"), global.yes)? {
                return Ok(());
            }
            console.revoke_session(&id).await?;
            Ok(())
        }
    }
}
