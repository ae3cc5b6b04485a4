use std::io::Read;

use bytes::Bytes;

use super::{ArchiveReader, ReaderKind};
use crate::error::{ImportError, ImportResult};

/// Where the bytes of an in-memory reader came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryForm {
    /// A resizable buffer handed over by the caller, read in place
    Buffer,
    /// A fixed byte array materialized from an arbitrary stream
    ByteArray,
}

/// Single-entry archive whose content lives entirely in process memory.
pub struct MemoryArchiveReader {
    name: String,
    data: Option<Bytes>,
    form: MemoryForm,
}

impl MemoryArchiveReader {
    /// Serve a caller-provided buffer without copying it
    pub fn from_buffer(data: Bytes, name: impl Into<String>) -> Self {
        Self::new(data, name, MemoryForm::Buffer)
    }

    /// Serve bytes that were copied out of a stream
    pub fn from_byte_array(data: Bytes, name: impl Into<String>) -> Self {
        Self::new(data, name, MemoryForm::ByteArray)
    }

    fn new(data: Bytes, name: impl Into<String>, form: MemoryForm) -> Self {
        MemoryArchiveReader {
            name: name.into(),
            data: Some(data),
            form,
        }
    }

    pub fn form(&self) -> MemoryForm {
        self.form
    }

    fn entry(&self, name: &str) -> ImportResult<&Bytes> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| ImportError::closed(&self.name))?;
        if name != self.name {
            return Err(ImportError::entry_not_found(&self.name, name));
        }
        Ok(data)
    }
}

impl ArchiveReader for MemoryArchiveReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::Memory(self.form)
    }

    fn entries(&self) -> ImportResult<Vec<String>> {
        if self.data.is_none() {
            return Err(ImportError::closed(&self.name));
        }
        Ok(vec![self.name.clone()])
    }

    fn open_entry(&mut self, name: &str) -> ImportResult<Box<dyn Read + '_>> {
        let data = self.entry(name)?;
        Ok(Box::new(&data[..]))
    }

    fn entry_size(&mut self, name: &str) -> ImportResult<u64> {
        Ok(self.entry(name)?.len() as u64)
    }

    fn read_entry(&mut self, name: &str) -> ImportResult<Vec<u8>> {
        Ok(self.entry(name)?.to_vec())
    }

    fn close(&mut self) {
        self.data = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_round_trip() {
        let png = Bytes::from_static(b"\x89PNG\r\n\x1a\nIHDR");
        let mut reader = MemoryArchiveReader::from_buffer(png.clone(), "cover.jpg");

        assert_eq!(reader.kind(), ReaderKind::Memory(MemoryForm::Buffer));
        assert_eq!(reader.entries().unwrap(), vec!["cover.jpg"]);

        let mut out = Vec::new();
        reader.open_entry("cover.jpg").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, png);
    }

    #[test]
    fn test_byte_array_form() {
        let mut reader = MemoryArchiveReader::from_byte_array(Bytes::from(vec![1, 2, 3]), "a.bin");
        assert_eq!(reader.form(), MemoryForm::ByteArray);
        assert_eq!(reader.entry_size("a.bin").unwrap(), 3);
        assert!(reader.read_entry("b.bin").unwrap_err().is_entry_not_found());
    }

    #[test]
    fn test_close_releases_buffer() {
        let mut reader = MemoryArchiveReader::from_buffer(Bytes::from_static(b"x"), "x");
        reader.close();
        reader.close();
        assert!(matches!(reader.entries(), Err(ImportError::Closed { .. })));
        assert!(matches!(reader.read_entry("x"), Err(ImportError::Closed { .. })));
    }
}
