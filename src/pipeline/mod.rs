//! Batch import runner.
//!
//! The importer that turns archive entries into domain records lives outside
//! this crate; it plugs in through [`Importer`]. The runner resolves each
//! task's reader on the blocking pool, hands it to the importer, and cleans up
//! the source file according to [`PipelineConfig`]. A failing task never stops
//! the rest of the batch.

pub mod extract;

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, warn};

use crate::archive::ArchiveReader;
use crate::error::ImportError;
use crate::task::ImportTask;

pub use extract::{ExtractImporter, ExtractSummary};

/// Consumer of archive readers (the downstream model importer)
pub trait Importer: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Import everything this task's reader exposes. Runs on a blocking thread.
    fn import(
        &self,
        task: &ImportTask,
        reader: &mut dyn ArchiveReader,
    ) -> anyhow::Result<Self::Output>;
}

/// Batch runner settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of tasks in flight
    pub concurrency: usize,
    /// Delete the source file after a successful import
    pub delete_on_success: bool,
    /// Delete the source file after a failed import
    pub delete_on_failure: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            concurrency: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            delete_on_success: false,
            delete_on_failure: false,
        }
    }
}

/// Why a task in a batch did not import
#[derive(Debug, Error)]
pub enum TaskFailure {
    /// The source could not be resolved or read
    #[error(transparent)]
    Archive(#[from] ImportError),
    /// The importer rejected the content
    #[error("importer failed: {0:#}")]
    Importer(anyhow::Error),
    /// The blocking worker panicked or was cancelled
    #[error("import worker stopped")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result of one task in a batch
#[derive(Debug)]
pub struct ImportOutcome<T> {
    /// Display name of the task
    pub task: String,
    pub result: Result<T, TaskFailure>,
}

impl<T> ImportOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every task through `importer`, returning outcomes in submission order.
pub async fn run_batch<I: Importer>(
    importer: Arc<I>,
    tasks: Vec<ImportTask>,
    config: &PipelineConfig,
) -> Vec<ImportOutcome<I::Output>> {
    run_batch_with(importer, tasks, config, |_| {}).await
}

/// Like [`run_batch`], calling `on_complete` as each outcome becomes available.
pub async fn run_batch_with<I, F>(
    importer: Arc<I>,
    tasks: Vec<ImportTask>,
    config: &PipelineConfig,
    mut on_complete: F,
) -> Vec<ImportOutcome<I::Output>>
where
    I: Importer,
    F: FnMut(&ImportOutcome<I::Output>),
{
    let total = tasks.len();
    let concurrency = config.concurrency.max(1);
    debug!(tasks = total, concurrency, "starting import batch");

    let mut pending = stream::iter(tasks)
        .map(|task| {
            let importer = Arc::clone(&importer);
            let config = config.clone();
            let name = task.to_string();
            async move {
                let result = tokio::task::spawn_blocking(move || process(&*importer, task, &config))
                    .await
                    .unwrap_or_else(|e| Err(TaskFailure::Worker(e)));

                if let Err(e) = &result {
                    warn!(task = %name, error = %e, "import task failed");
                }
                ImportOutcome { task: name, result }
            }
        })
        .buffered(concurrency);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = pending.next().await {
        on_complete(&outcome);
        outcomes.push(outcome);
    }
    outcomes
}

/// Import one task and clean up its source. Blocking.
fn process<I: Importer>(
    importer: &I,
    mut task: ImportTask,
    config: &PipelineConfig,
) -> Result<I::Output, TaskFailure> {
    let result = import_one(importer, &mut task);

    let delete = if result.is_ok() {
        config.delete_on_success
    } else {
        config.delete_on_failure
    };
    if delete {
        // Cleanup problems do not change the import result
        if let Err(e) = task.delete_file() {
            warn!(task = %task, error = %e, "failed to delete import source");
        }
    }

    result
}

fn import_one<I: Importer>(importer: &I, task: &mut ImportTask) -> Result<I::Output, TaskFailure> {
    let mut reader = task.get_reader()?;
    let result = importer
        .import(task, reader.as_mut())
        .map_err(TaskFailure::Importer);
    reader.close();
    result
}
