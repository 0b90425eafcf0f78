use clap::Parser;
use std::process::ExitCode;

use lineproc::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = cli.output();

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "run failed");
            output.error(&format!("Error: {err:#}"));
            if output.is_verbose() {
                eprintln!("{err:?}");
            }
            ExitCode::FAILURE
        }
    }
}
