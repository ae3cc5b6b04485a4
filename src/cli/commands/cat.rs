use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use std::io::{self, Write};

use super::{Command, task_for_source};
use crate::cli::output::is_broken_pipe;

/// Write one entry of an import source to stdout
#[derive(Debug, Clone, Args)]
pub struct CatCommand {
    /// File, directory, or `-` for stdin
    pub source: String,

    /// Entry name as printed by `ls`
    pub entry: String,

    /// Name for stdin content
    #[arg(long)]
    pub name: Option<String>,
}

impl CatCommand {
    /// Stream the entry into `out`. Blocking.
    pub fn copy_to<W: Write>(&self, out: &mut W) -> Result<u64> {
        let mut task = task_for_source(&self.source, self.name.as_deref());
        let mut reader = task
            .get_reader()
            .with_context(|| format!("Cannot read {}", self.source))?;

        let copied = {
            let mut input = reader.open_entry(&self.entry)?;
            match io::copy(&mut input, out) {
                Ok(copied) => copied,
                Err(e) if is_broken_pipe(&e) => 0,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", self.entry));
                }
            }
        };
        reader.close();

        match out.flush() {
            Err(e) if !is_broken_pipe(&e) => Err(e.into()),
            _ => Ok(copied),
        }
    }
}

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &str {
        "cat"
    }

    async fn execute(&self) -> Result<()> {
        let command = self.clone();
        tokio::task::spawn_blocking(move || {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            command.copy_to(&mut out)
        })
        .await??;
        Ok(())
    }
}
