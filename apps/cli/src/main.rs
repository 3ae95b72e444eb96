//! # Tally CLI Entry Point
//!
//! Parses arguments and hands off to [`tally_cli::run`]. The setup lives in
//! the library so it can be tested.

use std::process::ExitCode;

use clap::Parser;
use tally_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match tally_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.code(), e);
            ExitCode::from(e.exit_status())
        }
    }
}
