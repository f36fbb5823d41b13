//! Tonegen CLI - batch generation of precise sine test tones
//!
//! This binary parses arguments, installs logging and dispatches to the
//! command implementations in the library crate.

use clap::Parser;
use std::process::ExitCode;

use tonegen_cli::cli_args::{Cli, Commands};
use tonegen_cli::commands;
use tonegen_cli::logging::setup_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Doctor { ffmpeg, out_dir } => {
            commands::doctor::run(ffmpeg.as_deref(), out_dir.as_deref())
        }
        Commands::Inspect { input, json } => commands::inspect::run(input, *json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
