use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use bytes::Bytes;
use zip::ZipArchive;
use zip::result::ZipError;

use super::{ArchiveReader, ReaderKind, base_name};
use crate::error::{ImportError, ImportResult};

/// Reader over a zip archive held in a file or in memory.
///
/// Entries are decompressed on the fly as the returned stream is read, so
/// entries larger than memory can be imported.
pub struct ZipArchiveReader<R: Read + Seek> {
    name: String,
    archive: Option<ZipArchive<R>>,
}

impl ZipArchiveReader<File> {
    /// Open a zip archive from disk, read-only
    pub fn open(path: &Path) -> ImportResult<Self> {
        let file = File::open(path).map_err(|e| ImportError::io("zip.open", path, e))?;
        Self::new(file, base_name(path))
    }
}

impl ZipArchiveReader<Cursor<Bytes>> {
    /// Read a zip archive that already lives in memory
    pub fn from_bytes(data: Bytes, name: impl Into<String>) -> ImportResult<Self> {
        Self::new(Cursor::new(data), name)
    }
}

impl<R: Read + Seek> ZipArchiveReader<R> {
    /// Parse the central directory of `reader`
    pub fn new(reader: R, name: impl Into<String>) -> ImportResult<Self> {
        let name = name.into();
        let archive =
            ZipArchive::new(reader).map_err(|e| ImportError::zip("zip.decode", &name, e))?;
        Ok(ZipArchiveReader {
            name,
            archive: Some(archive),
        })
    }

    fn archive_mut(&mut self) -> ImportResult<&mut ZipArchive<R>> {
        self.archive
            .as_mut()
            .ok_or_else(|| ImportError::closed(&self.name))
    }

    fn map_entry_error(&self, entry: &str, err: ZipError) -> ImportError {
        match err {
            ZipError::FileNotFound => ImportError::entry_not_found(&self.name, entry),
            other => ImportError::zip("zip.read_entry", format!("{}/{entry}", self.name), other),
        }
    }
}

/// Zip tables store directories as explicit records ending in `/`.
fn is_directory_record(name: &str) -> bool {
    name.ends_with('/')
}

impl<R: Read + Seek + Send> ArchiveReader for ZipArchiveReader<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::Zip
    }

    fn entries(&self) -> ImportResult<Vec<String>> {
        let archive = self
            .archive
            .as_ref()
            .ok_or_else(|| ImportError::closed(&self.name))?;

        Ok(archive
            .file_names()
            .filter(|name| !is_directory_record(name))
            .map(String::from)
            .collect())
    }

    fn open_entry(&mut self, name: &str) -> ImportResult<Box<dyn Read + '_>> {
        if is_directory_record(name) {
            return Err(ImportError::entry_not_found(&self.name, name));
        }

        let lookup = self.archive_mut()?.index_for_name(name);
        let Some(index) = lookup else {
            return Err(ImportError::entry_not_found(&self.name, name));
        };

        let archive_name = self.name.clone();
        let archive = self.archive_mut()?;
        match archive.by_index(index) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) => Err(ImportError::zip(
                "zip.read_entry",
                format!("{archive_name}/{name}"),
                e,
            )),
        }
    }

    fn entry_size(&mut self, name: &str) -> ImportResult<u64> {
        if is_directory_record(name) {
            return Err(ImportError::entry_not_found(&self.name, name));
        }

        let result = self.archive_mut()?.by_name(name).map(|file| file.size());
        result.map_err(|e| self.map_entry_error(name, e))
    }

    fn close(&mut self) {
        self.archive = None;
    }
}
