//! Resolve import sources into uniform archive readers.
//!
//! An [`ImportTask`] wraps a path or an in-memory/streamed source. When asked
//! for a reader it sniffs the content (zip magic, not file extension) and
//! picks one of four [`ArchiveReader`] implementations: zip, directory,
//! single file, or in-memory buffer.

pub mod archive;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod task;
pub mod telemetry;
pub mod ui;

pub use archive::{ArchiveReader, ReaderKind};
pub use error::{ImportError, ImportResult};
pub use task::{DeletePolicy, ImportSource, ImportTask};
