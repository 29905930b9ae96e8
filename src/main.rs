//! Gitlet - command-line entry point

use std::io::{self, Write};
use std::process::ExitCode;

use tracing::Level;

use gitlet::cli::{self, Cli, CliError};

fn main() -> ExitCode {
    let cli = match Cli::from_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(CliError::Display(e)) => {
            // help and version
            return match e.print() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(e) => {
            println!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.config().verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = cli::run(cli, &mut out);
    let flushed = out.flush();
    drop(out);

    match result.and_then(|()| flushed.map_err(CliError::from)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "command failed");
            println!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
