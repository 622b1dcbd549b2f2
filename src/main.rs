//! Binary demonstrating `reframe` fragmentation.
//!
//! Parses CLI arguments, fragments a synthetic frame and reports the result.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    match cli::run(&cli, &mut std::io::stdout().lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "fragmentation demo failed");
            ExitCode::FAILURE
        }
    }
}
