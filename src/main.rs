//! `socialflow` binary entry point.

use std::process::ExitCode;

use clap::Parser;

use socialflow::cli::{self, Cli};
use socialflow::observability;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.global.verbose {
        observability::init_logging_with(Some("socialflow=debug"));
    } else {
        observability::init_logging();
    }

    match cli::run(&cli) {
        Ok(response) => {
            match serde_json::to_string_pretty(&response) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(2);
                }
            }
            if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
