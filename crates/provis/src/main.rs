mod cli;
mod commands;
mod config;
mod error;
mod notify;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use provis_core::{Console, FileSessionPersistence};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;
use crate::notify::StderrNotifier;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Logs go to stderr so they never mix with rendered output.
/// `PROVIS_LOG_FORMAT=json` switches to structured lines.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if std::env::var("PROVIS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "provis", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let console = build_console(&cli.global, &cfg)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &console, &cfg, &cli.global).await
        }
    }
}

/// Build the console from the config file, profile, and CLI overrides,
/// restoring whatever session the profile last persisted.
fn build_console(global: &GlobalOpts, cfg: &config::Config) -> Result<Console, CliError> {
    let console_config = config::console_config(global, cfg)?;
    let session_file = config::session_file(global, cfg);
    tracing::debug!(
        url = %console_config.url,
        session = %session_file.display(),
        "building console"
    );

    let persistence = Arc::new(FileSessionPersistence::new(session_file));
    let notifier = Arc::new(StderrNotifier::new(&global.color, global.quiet));
    Ok(Console::new(&console_config, persistence, notifier)?)
}
