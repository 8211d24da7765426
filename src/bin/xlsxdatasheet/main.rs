//! Datasheet renderer CLI.

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod logging;

use crate::cli::Cli;
use crate::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_flags(cli.verbose, cli.quiet));

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
