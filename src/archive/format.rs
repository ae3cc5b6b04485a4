//! Content sniffing.
//!
//! Archive formats are detected from leading magic bytes, never from the file
//! extension: a `.osz` package is just a zip file with another name.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::trace;

/// Zip local file header signature (`PK\x03\x04`).
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Number of leading bytes needed to classify content.
pub const SNIFF_LEN: usize = ZIP_MAGIC.len();

/// Content format detected from magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Unknown,
}

impl ArchiveFormat {
    /// Classify a header prefix
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(&ZIP_MAGIC) {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::Unknown
        }
    }

    pub fn is_zip(self) -> bool {
        self == ArchiveFormat::Zip
    }
}

/// Check whether an in-memory buffer starts with the zip signature.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    ArchiveFormat::detect(data).is_zip()
}

/// Check whether the file at `path` is a zip archive.
///
/// Unreadable paths (missing files, directories, permission errors) are
/// reported as "not a zip"; callers surface the real error when they go on
/// to open the path.
pub fn is_zip_path(path: &Path) -> bool {
    match File::open(path).and_then(|mut file| read_header(&mut file)) {
        Ok(header) => is_zip_bytes(&header),
        Err(e) => {
            trace!(path = %path.display(), error = %e, "sniff failed; treating as non-zip");
            false
        }
    }
}

/// Read up to [`SNIFF_LEN`] bytes, tolerating short reads and short inputs.
fn read_header<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
