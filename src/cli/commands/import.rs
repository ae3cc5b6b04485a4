use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::Args;
use colored::*;
use humansize::{DECIMAL, format_size};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Command, STDIN_SOURCE, task_for_source};
use crate::pipeline::{ExtractImporter, ExtractSummary, ImportOutcome, PipelineConfig, run_batch_with};
use crate::ui::create_task_bar;

/// Extract one or more import sources into a directory
#[derive(Debug, Clone, Args)]
pub struct ImportCommand {
    /// Files, directories, or `-` for stdin
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Destination directory; each source lands in `<DIR>/<source stem>/`
    #[arg(long, value_name = "DIR")]
    pub into: PathBuf,

    /// Name for stdin content
    #[arg(long)]
    pub name: Option<String>,

    /// Maximum number of sources processed at once
    #[arg(long, env = "ARCHIVE_IMPORT_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Delete each source file after it imports successfully
    #[arg(long)]
    pub delete_source: bool,

    /// Delete source files that fail to import
    #[arg(long)]
    pub delete_failed: bool,
}

impl ImportCommand {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            concurrency: self.concurrency.unwrap_or(defaults.concurrency).max(1),
            delete_on_success: self.delete_source,
            delete_on_failure: self.delete_failed,
        }
    }

    fn validate(&self) -> Result<()> {
        let stdin_sources = self.sources.iter().filter(|s| *s == STDIN_SOURCE).count();
        if stdin_sources > 1 {
            return Err(anyhow!("stdin ('-') can only be imported once per run"));
        }
        Ok(())
    }

    fn report(outcomes: &[ImportOutcome<ExtractSummary>]) -> Result<()> {
        let mut failed = 0;
        for outcome in outcomes {
            match &outcome.result {
                Ok(summary) => eprintln!(
                    "{} {} -> {} ({} files, {})",
                    "ok".green().bold(),
                    outcome.task,
                    summary.target.display(),
                    summary.files,
                    format_size(summary.bytes, DECIMAL)
                ),
                Err(e) => {
                    failed += 1;
                    eprintln!("{} {}: {}", "failed".red().bold(), outcome.task, e);
                }
            }
        }

        if failed > 0 {
            return Err(anyhow!("{failed} of {} imports failed", outcomes.len()));
        }
        Ok(())
    }
}

#[async_trait]
impl Command for ImportCommand {
    fn name(&self) -> &str {
        "import"
    }

    async fn execute(&self) -> Result<()> {
        self.validate()?;

        let tasks = self
            .sources
            .iter()
            .map(|source| task_for_source(source, self.name.as_deref()))
            .collect::<Vec<_>>();
        let importer = Arc::new(ExtractImporter::new(&self.into));
        let config = self.pipeline_config();

        let bar = create_task_bar(tasks.len() as u64);
        let outcomes = run_batch_with(importer, tasks, &config, |outcome| {
            bar.set_message(outcome.task.clone());
            bar.inc(1);
        })
        .await;
        bar.finish_and_clear();

        Self::report(&outcomes)
    }
}
