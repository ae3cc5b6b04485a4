//! Import tasks: a content source plus the logic to turn it into an archive reader.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use tracing::{debug, info};

use crate::archive::{
    ArchiveReader, DirectoryArchiveReader, MemoryArchiveReader, SingleFileArchiveReader,
    ZipArchiveReader, base_name, format,
};
use crate::error::{ImportError, ImportResult};

/// Content handed to a task instead of a filesystem path
pub enum ImportSource {
    /// A resizable in-memory buffer; read in place, sniffed for zip content
    Buffer(BytesMut),
    /// Any other byte stream; copied into memory the first time a reader is requested
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Buffer(buffer) => f.debug_tuple("Buffer").field(&buffer.len()).finish(),
            ImportSource::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Whether [`ImportTask::delete_file`] actually removes anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    Delete,
    /// Leave the file alone (already imported or owned by someone else)
    Retain,
}

/// Internal stream slot. A stream is taken out exactly once and replaced by
/// the bytes it produced.
enum Content {
    Path,
    Buffer(Bytes),
    Stream(Box<dyn Read + Send>),
    Materialized(Bytes),
    /// The stream failed part way; its content is lost
    Exhausted,
}

/// A unit of import work: a path on disk, or a stream paired with a filename.
pub struct ImportTask {
    location: PathBuf,
    content: Content,
    delete_policy: DeletePolicy,
}

impl ImportTask {
    /// Import from a file or directory on the local filesystem
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImportTask {
            location: path.into(),
            content: Content::Path,
            delete_policy: DeletePolicy::default(),
        }
    }

    /// Import from in-memory or streamed content. The task owns the source from here on.
    pub fn from_source(source: ImportSource, filename: impl Into<PathBuf>) -> Self {
        let content = match source {
            ImportSource::Buffer(buffer) => Content::Buffer(buffer.freeze()),
            ImportSource::Stream(stream) => Content::Stream(stream),
        };
        ImportTask {
            location: filename.into(),
            content,
            delete_policy: DeletePolicy::default(),
        }
    }

    /// Import from a resizable buffer
    pub fn from_buffer(buffer: impl Into<BytesMut>, filename: impl Into<PathBuf>) -> Self {
        Self::from_source(ImportSource::Buffer(buffer.into()), filename)
    }

    /// Import from an arbitrary stream
    pub fn from_stream<R: Read + Send + 'static>(stream: R, filename: impl Into<PathBuf>) -> Self {
        Self::from_source(ImportSource::Stream(Box::new(stream)), filename)
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Path of the file, or the filename supplied with a stream
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    pub fn is_stream_backed(&self) -> bool {
        !matches!(self.content, Content::Path)
    }

    /// Build a reader over this task's content.
    ///
    /// Safe to call repeatedly; every call derives a fresh reader. A plain
    /// stream is read to the end (and dropped) on the first call.
    pub fn get_reader(&mut self) -> ImportResult<Box<dyn ArchiveReader>> {
        let name = self.to_string();

        let reader: Box<dyn ArchiveReader> = match &self.content {
            Content::Path => return reader_from_path(&self.location),
            Content::Buffer(data) => {
                if format::is_zip_bytes(data) {
                    Box::new(ZipArchiveReader::from_bytes(data.clone(), name)?)
                } else {
                    Box::new(MemoryArchiveReader::from_buffer(data.clone(), name))
                }
            }
            Content::Materialized(data) => {
                Box::new(MemoryArchiveReader::from_byte_array(data.clone(), name))
            }
            Content::Stream(_) => {
                let data = self.materialize()?;
                Box::new(MemoryArchiveReader::from_byte_array(data, name))
            }
            Content::Exhausted => {
                return Err(ImportError::io(
                    "task.get_reader",
                    &self.location,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "import stream already consumed"),
                ));
            }
        };

        debug!(task = %self, kind = ?reader.kind(), "resolved archive reader");
        Ok(reader)
    }

    /// Copy a plain stream into memory, consuming it.
    // TODO: stream large non-buffer sources through a temp file instead of holding them in memory
    fn materialize(&mut self) -> ImportResult<Bytes> {
        let Content::Stream(mut stream) = std::mem::replace(&mut self.content, Content::Path)
        else {
            return Err(ImportError::io(
                "task.materialize",
                &self.location,
                io::Error::other("task has no pending stream"),
            ));
        };

        let mut buffer = Vec::new();
        let read = stream.read_to_end(&mut buffer);
        drop(stream);
        if let Err(e) = read {
            self.content = Content::Exhausted;
            return Err(ImportError::io("task.read_stream", &self.location, e));
        }

        debug!(task = %self, bytes = buffer.len(), "materialized import stream");
        let data = Bytes::from(buffer);
        self.content = Content::Materialized(data.clone());
        Ok(data)
    }

    /// Delete the file behind this task.
    ///
    /// A missing file is not an error, so cleanup can run more than once.
    /// Stream-backed tasks and [`DeletePolicy::Retain`] tasks never touch
    /// the filesystem.
    pub fn delete_file(&self) -> ImportResult<()> {
        if self.delete_policy == DeletePolicy::Retain || self.is_stream_backed() {
            return Ok(());
        }

        if !self.location.is_file() {
            return Ok(());
        }

        match fs::remove_file(&self.location) {
            Ok(()) => {
                info!(path = %self.location.display(), "deleted import source");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ImportError::io("task.delete_file", &self.location, e)),
        }
    }
}

/// Resolve a filesystem path: zip content first, then directory, then loose file.
fn reader_from_path(path: &Path) -> ImportResult<Box<dyn ArchiveReader>> {
    let reader: Box<dyn ArchiveReader> = if format::is_zip_path(path) {
        Box::new(ZipArchiveReader::open(path)?)
    } else if path.is_dir() {
        Box::new(DirectoryArchiveReader::new(path))
    } else if path.is_file() {
        Box::new(SingleFileArchiveReader::new(path))
    } else {
        return Err(ImportError::InvalidFormat {
            path: path.to_path_buf(),
        });
    };

    debug!(path = %path.display(), kind = ?reader.kind(), "resolved archive reader");
    Ok(reader)
}

impl fmt::Display for ImportTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location.file_name() {
            Some(name) => write!(f, "{}", name.to_string_lossy()),
            None if self.location.as_os_str().is_empty() => Ok(()),
            None => write!(f, "{}", base_name(&self.location)),
        }
    }
}

impl fmt::Debug for ImportTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.content {
            Content::Path => "path",
            Content::Buffer(_) => "buffer",
            Content::Stream(_) => "stream",
            Content::Materialized(_) => "materialized",
            Content::Exhausted => "exhausted",
        };
        f.debug_struct("ImportTask")
            .field("location", &self.location)
            .field("source", &source)
            .field("delete_policy", &self.delete_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{MemoryForm, ReaderKind};
    use std::io::Cursor;

    #[test]
    fn test_display_is_file_name() {
        assert_eq!(ImportTask::from_path("/tmp/songs/song.osz").to_string(), "song.osz");
        assert_eq!(
            ImportTask::from_buffer(&b"x"[..], "cover.jpg").to_string(),
            "cover.jpg"
        );
    }

    #[test]
    fn test_stream_consumed_once_then_reused() {
        let mut task = ImportTask::from_stream(Cursor::new(b"PK\x03\x04not really".to_vec()), "a.osz");
        assert!(task.is_stream_backed());

        let mut first = task.get_reader().unwrap();
        assert_eq!(first.kind(), ReaderKind::Memory(MemoryForm::ByteArray));
        assert_eq!(first.read_entry("a.osz").unwrap(), b"PK\x03\x04not really");

        let mut second = task.get_reader().unwrap();
        assert_eq!(second.read_entry("a.osz").unwrap(), b"PK\x03\x04not really");
        assert!(matches!(task.content, Content::Materialized(_)));
    }

    #[test]
    fn test_failing_stream_surfaces_io_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"))
            }
        }

        let mut task = ImportTask::from_stream(Broken, "broken.osz");
        assert!(matches!(task.get_reader().err(), Some(ImportError::Io { .. })));
        // A second attempt must not pretend the content was empty
        assert!(matches!(task.get_reader().err(), Some(ImportError::Io { .. })));
    }

    #[test]
    fn test_stream_backed_delete_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let shadow = dir.path().join("cover.jpg");
        fs::write(&shadow, b"keep").unwrap();

        let task = ImportTask::from_buffer(&b"data"[..], &shadow);
        task.delete_file().unwrap();
        assert!(shadow.exists());
    }

    #[test]
    fn test_retain_policy_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.osz");
        fs::write(&path, b"data").unwrap();

        let task = ImportTask::from_path(&path).with_delete_policy(DeletePolicy::Retain);
        task.delete_file().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_delete_leaves_directories_alone() {
        let dir = tempfile::tempdir().unwrap();
        let task = ImportTask::from_path(dir.path());
        task.delete_file().unwrap();
        assert!(dir.path().is_dir());
    }
}
