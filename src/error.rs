//! Errors raised while resolving import sources and reading archive entries.
//!
//! I/O, zip and directory-walk failures keep their original error as the
//! `source`, tagged with the operation and path that triggered them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive and import-task operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors produced by import tasks and archive readers.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The path is neither a zip archive, a directory nor an existing file.
    #[error("{} is not a valid archive", .path.display())]
    InvalidFormat {
        /// Path that failed to resolve.
        path: PathBuf,
    },
    /// A named entry does not exist in the archive.
    #[error("entry not found in {archive}: {entry}")]
    EntryNotFound {
        /// Display name of the archive.
        archive: String,
        /// Entry name that was requested.
        entry: String,
    },
    /// An entry name would resolve outside of the archive root.
    #[error("invalid entry name: {entry}")]
    InvalidEntryName {
        /// Offending entry name.
        entry: String,
    },
    /// The reader was used after `close`.
    #[error("archive reader for {archive} is closed")]
    Closed {
        /// Display name of the archive.
        archive: String,
    },
    /// Filesystem or stream failures.
    #[error("{operation} failed for {}", .path.display())]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Zip decoding failures.
    #[error("{operation} failed for {}", .path.display())]
    Zip {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Archive involved in the failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// Directory traversal failures.
    #[error("{operation} failed for {}", .path.display())]
    Walk {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Directory being walked.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
}

impl ImportError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walk(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walk {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn entry_not_found(archive: &str, entry: &str) -> Self {
        Self::EntryNotFound {
            archive: archive.to_string(),
            entry: entry.to_string(),
        }
    }

    pub(crate) fn closed(archive: &str) -> Self {
        Self::Closed {
            archive: archive.to_string(),
        }
    }

    /// Whether this error means the requested entry is absent.
    pub fn is_entry_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound { .. })
    }
}
