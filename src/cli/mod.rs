pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};
use commands::Command;
use commands::cat::CatCommand;
use commands::import::ImportCommand;
use commands::ls::LsCommand;

/// Inspect and import zip packages, directories and loose files
#[derive(Debug, Parser)]
#[command(name = "archive-import", version, about)]
pub struct Cli {
    /// Log filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, env = "ARCHIVE_IMPORT_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Log output format: pretty or json
    #[arg(long, global = true, env = "ARCHIVE_IMPORT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the entries of a source
    Ls(LsCommand),
    /// Print one entry of a source
    Cat(CatCommand),
    /// Extract sources into a directory
    Import(ImportCommand),
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }

    fn command(&self) -> &dyn Command {
        match &self.command {
            Commands::Ls(command) => command,
            Commands::Cat(command) => command,
            Commands::Import(command) => command,
        }
    }

    /// Run the selected subcommand
    pub async fn run(&self) -> Result<()> {
        let command = self.command();
        tracing::debug!(command = command.name(), "running command");
        command.execute().await
    }
}
