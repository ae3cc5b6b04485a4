use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use super::{ArchiveReader, ReaderKind, base_name, portable_name, sanitize_local_name};
use crate::error::{ImportError, ImportResult};

/// Reader over a plain directory tree.
///
/// Every regular file below the root is an entry, named by its path relative
/// to the root with `/` separators.
pub struct DirectoryArchiveReader {
    name: String,
    root: PathBuf,
    closed: bool,
}

impl DirectoryArchiveReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        DirectoryArchiveReader {
            name: base_name(&root),
            root,
            closed: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_open(&self) -> ImportResult<()> {
        if self.closed {
            return Err(ImportError::closed(&self.name));
        }
        Ok(())
    }

    /// Resolve an entry name to a regular file below the root
    fn resolve(&self, name: &str) -> ImportResult<PathBuf> {
        self.ensure_open()?;
        let path = self.root.join(sanitize_local_name(name)?);
        if !path.is_file() {
            return Err(ImportError::entry_not_found(&self.name, name));
        }
        Ok(path)
    }
}

impl ArchiveReader for DirectoryArchiveReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::Directory
    }

    fn entries(&self) -> ImportResult<Vec<String>> {
        self.ensure_open()?;

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| ImportError::walk("directory.walk", &self.root, e))?;
            // Symlinks count when they point at a regular file
            if !entry.path().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or_else(|_| entry.path());
            match portable_name(relative) {
                Some(name) => names.push(name),
                None => warn!(
                    path = %entry.path().display(),
                    "skipping file with a non UTF-8 name"
                ),
            }
        }
        Ok(names)
    }

    fn open_entry(&mut self, name: &str) -> ImportResult<Box<dyn Read + '_>> {
        let path = self.resolve(name)?;
        let file = File::open(&path).map_err(|e| ImportError::io("directory.open_entry", &path, e))?;
        Ok(Box::new(file))
    }

    fn entry_size(&mut self, name: &str) -> ImportResult<u64> {
        let path = self.resolve(name)?;
        let metadata =
            fs::metadata(&path).map_err(|e| ImportError::io("directory.entry_size", &path, e))?;
        Ok(metadata.len())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
