//! Command dispatch: bridges CLI args -> console calls -> output formatting.

pub mod auth;
pub mod bundles;
pub mod config_cmd;
pub mod customers;
pub mod devices;
pub mod jobs;
pub mod tasks;
pub mod util;

use provis_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
///
/// Everything except `auth` needs a session; one is established from the
/// configured identity token when none is persisted.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cmd = match cmd {
        Command::Auth(args) => return auth::handle(console, cfg, args, global).await,
        other => other,
    };

    util::ensure_session(console, cfg, global).await?;
    match cmd {
        Command::Customers(args) => customers::handle(console, args, global).await,
        Command::Devices(args) => devices::handle(console, args, global).await,
        Command::Jobs(args) => jobs::handle(console, args, global).await,
        Command::Tasks(args) => tasks::handle(console, args, global).await,
        Command::Bundles(args) => bundles::handle(console, args, global).await,
        // Handled before dispatch
        Command::Auth(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
