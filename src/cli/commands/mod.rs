use anyhow::Result;
use async_trait::async_trait;

use crate::task::ImportTask;

pub mod cat;
pub mod import;
pub mod ls;

/// Source argument meaning "read standard input"
pub const STDIN_SOURCE: &str = "-";

/// Name given to stdin content when `--name` is not supplied
pub const STDIN_DEFAULT_NAME: &str = "stdin";

/// Trait for CLI commands
#[async_trait]
pub trait Command: Send + Sync {
    /// Get the command name
    fn name(&self) -> &str;

    /// Execute the command
    async fn execute(&self) -> Result<()>;
}

/// Build an import task for a command-line source
pub fn task_for_source(source: &str, name: Option<&str>) -> ImportTask {
    if source == STDIN_SOURCE {
        let name = name.unwrap_or(STDIN_DEFAULT_NAME).to_string();
        return ImportTask::from_stream(std::io::stdin(), name);
    }
    ImportTask::from_path(source)
}
