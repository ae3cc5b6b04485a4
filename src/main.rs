use archive_import::cli::Cli;
use archive_import::telemetry::init_logging;
use clap::Parser;
use colored::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.logging_config()) {
        eprintln!("{} {e}", "Warning:".yellow().bold());
    }

    if let Err(e) = cli.run().await {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
