//! apidrift CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use apidrift::cli::{Cli, Command};
use apidrift::commands;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> apidrift::Result<String> {
    match cli.command {
        Command::Diff {
            before,
            after,
            mode,
            config,
        } => commands::run_diff(
            &before,
            &after,
            mode.into(),
            config.as_deref(),
            cli.format,
        ),
        Command::Snapshot {
            entrypoint,
            mode,
            config,
        } => commands::run_snapshot(&entrypoint, mode.into(), config.as_deref(), cli.format),
        Command::ExportsDiff { before, after } => {
            commands::run_exports_diff(&before, &after, cli.format)
        }
        Command::Usage {
            module,
            symbols,
            root,
            candidates,
        } => commands::run_usage(&module, &symbols, &root, &candidates, cli.format),
    }
}

/// Route diagnostics to stderr; stdout carries only the report
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
