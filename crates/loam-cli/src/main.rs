use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use loam_sdk::SdkError;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::run_command(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit status for a failed command, taken from the SDK error kind when there is one.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SdkError>() {
        Some(sdk) => {
            tracing::debug!(kind = %sdk.kind(), "command failed");
            sdk.kind().exit_code()
        }
        None => 1,
    }
}
