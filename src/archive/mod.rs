pub mod directory;
pub mod format;
pub mod memory;
pub mod single_file;
pub mod zip;

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::{ImportError, ImportResult};

pub use directory::DirectoryArchiveReader;
pub use format::ArchiveFormat;
pub use memory::{MemoryArchiveReader, MemoryForm};
pub use single_file::SingleFileArchiveReader;
pub use self::zip::ZipArchiveReader;

/// Which backing store a reader was built over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Zip,
    Directory,
    SingleFile,
    Memory(MemoryForm),
}

impl std::fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReaderKind::Zip => "zip",
            ReaderKind::Directory => "directory",
            ReaderKind::SingleFile => "file",
            ReaderKind::Memory(MemoryForm::Buffer) => "memory buffer",
            ReaderKind::Memory(MemoryForm::ByteArray) => "byte array",
        };
        f.write_str(label)
    }
}

/// Read-only, randomly accessible view over a set of named entries.
///
/// Every import source (zip package, directory, loose file, in-memory
/// buffer) is exposed through this trait so importers never care where the
/// bytes come from.
pub trait ArchiveReader: Send {
    /// Display name of the archive (usually the file or directory name)
    fn name(&self) -> &str;

    /// Backing store of this reader
    fn kind(&self) -> ReaderKind;

    /// List entry names
    ///
    /// The listing is rebuilt on every call. Order follows the backing
    /// store (zip table order, filesystem enumeration order) and must not be
    /// relied upon.
    fn entries(&self) -> ImportResult<Vec<String>>;

    /// Open an entry for streaming
    ///
    /// Fails with [`ImportError::EntryNotFound`] if `name` is not present.
    fn open_entry(&mut self, name: &str) -> ImportResult<Box<dyn Read + '_>>;

    /// Uncompressed size of an entry in bytes
    fn entry_size(&mut self, name: &str) -> ImportResult<u64>;

    /// Release the underlying handle. Calling this more than once is a no-op.
    fn close(&mut self);

    /// Read a whole entry into memory
    fn read_entry(&mut self, name: &str) -> ImportResult<Vec<u8>> {
        let archive = self.name().to_string();
        let mut stream = self.open_entry(name)?;
        let mut buffer = Vec::new();
        stream
            .read_to_end(&mut buffer)
            .map_err(|e| ImportError::io("read_entry", format!("{archive}/{name}"), e))?;
        Ok(buffer)
    }
}

/// Final path component as a display string, falling back to the whole path.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Convert a path relative to an archive root into a portable `/`-separated
/// entry name. Paths that are not valid UTF-8 have no such name.
pub(crate) fn portable_name(relative: &Path) -> Option<String> {
    relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .map(|segments| segments.join("/"))
}

/// Turn an archive entry name into a relative path, rejecting names that
/// would escape the archive root. Both `/` and `\\` separate segments.
pub(crate) fn sanitize_entry_name(entry: &str) -> ImportResult<PathBuf> {
    sanitize_with(entry, &['/', '\\'])
}

/// Like [`sanitize_entry_name`], but for names produced by [`portable_name`]
/// on this platform: only `/` and the native separator split segments.
pub(crate) fn sanitize_local_name(entry: &str) -> ImportResult<PathBuf> {
    sanitize_with(entry, &['/', std::path::MAIN_SEPARATOR])
}

fn sanitize_with(entry: &str, separators: &[char]) -> ImportResult<PathBuf> {
    let invalid = || ImportError::InvalidEntryName {
        entry: entry.to_string(),
    };

    let mut relative = PathBuf::new();
    for segment in entry.split(separators) {
        let segment_path = Path::new(segment);
        match segment_path.components().next() {
            None => continue,
            Some(Component::Normal(_)) if segment_path.components().count() == 1 => {
                relative.push(segment)
            }
            Some(Component::CurDir) => continue,
            _ => return Err(invalid()),
        }
    }

    if relative.as_os_str().is_empty() || entry.starts_with('/') {
        return Err(invalid());
    }
    Ok(relative)
}
