use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

use super::Importer;
use crate::archive::{ArchiveReader, sanitize_entry_name};
use crate::task::ImportTask;

/// Importer that unpacks every entry into `<root>/<task stem>/`.
///
/// Tasks sharing a stem (`song.osz` and `song.zip`) get distinct targets
/// (`song/`, `song (2)/`, ...) for the lifetime of the importer.
#[derive(Debug)]
pub struct ExtractImporter {
    root: PathBuf,
    claimed: Mutex<HashSet<PathBuf>>,
}

/// What an extraction wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub target: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

impl ExtractImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ExtractImporter {
            root: root.into(),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Preferred directory for a task's entries
    pub fn target_for(&self, task: &ImportTask) -> PathBuf {
        let display = task.to_string();
        let stem = Path::new(&display)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "import".to_string());
        self.root.join(stem)
    }

    /// Reserve a target no other task of this importer writes to
    fn claim_target(&self, task: &ImportTask) -> PathBuf {
        let preferred = self.target_for(task);
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if claimed.insert(preferred.clone()) {
            return preferred;
        }

        let stem = preferred
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut suffix = 2;
        loop {
            let candidate = self.root.join(format!("{stem} ({suffix})"));
            if claimed.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

impl Importer for ExtractImporter {
    type Output = ExtractSummary;

    fn import(&self, task: &ImportTask, reader: &mut dyn ArchiveReader) -> Result<ExtractSummary> {
        let target = self.claim_target(task);
        let mut summary = ExtractSummary {
            target: target.clone(),
            ..Default::default()
        };

        for name in reader.entries()? {
            let destination = target.join(sanitize_entry_name(&name)?);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            let mut output = File::create(&destination)
                .with_context(|| format!("Failed to create {}", destination.display()))?;
            let mut input = reader.open_entry(&name)?;
            let copied = io::copy(&mut input, &mut output)
                .with_context(|| format!("Failed to extract {name} from {}", task))?;

            debug!(task = %task, entry = %name, bytes = copied, "extracted entry");
            summary.files += 1;
            summary.bytes += copied;
        }

        Ok(summary)
    }
}
