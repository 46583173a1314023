use std::process::ExitCode;

use clap::Parser;

use rbacsync_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    rbacsync_observability::init_with(cli.log_format);

    match cli.run() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
