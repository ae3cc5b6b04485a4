use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{ArchiveReader, ReaderKind, base_name};
use crate::error::{ImportError, ImportResult};

/// Degenerate archive holding exactly one loose file.
///
/// The only entry is named after the file itself.
pub struct SingleFileArchiveReader {
    name: String,
    path: PathBuf,
    closed: bool,
}

impl SingleFileArchiveReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        SingleFileArchiveReader {
            name: base_name(&path),
            path,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_entry(&self, name: &str) -> ImportResult<()> {
        if self.closed {
            return Err(ImportError::closed(&self.name));
        }
        if name != self.name {
            return Err(ImportError::entry_not_found(&self.name, name));
        }
        Ok(())
    }
}

impl ArchiveReader for SingleFileArchiveReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::SingleFile
    }

    fn entries(&self) -> ImportResult<Vec<String>> {
        if self.closed {
            return Err(ImportError::closed(&self.name));
        }
        Ok(vec![self.name.clone()])
    }

    fn open_entry(&mut self, name: &str) -> ImportResult<Box<dyn Read + '_>> {
        self.check_entry(name)?;
        let file = File::open(&self.path)
            .map_err(|e| ImportError::io("single_file.open_entry", &self.path, e))?;
        Ok(Box::new(file))
    }

    fn entry_size(&mut self, name: &str) -> ImportResult<u64> {
        self.check_entry(name)?;
        let metadata = fs::metadata(&self.path)
            .map_err(|e| ImportError::io("single_file.entry_size", &self.path, e))?;
        Ok(metadata.len())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
