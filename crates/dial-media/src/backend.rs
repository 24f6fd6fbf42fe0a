use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{MediaError, Result};

/// Byte-addressed storage an output image is written to.
///
/// Writes past the current end grow the storage; any gap created that way must read back as
/// zero (it may be a hole in a sparse file).
pub trait StorageBackend {
    fn len(&mut self) -> Result<u64>;

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// In-memory backend, mostly useful for tests and for building images before writing them out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemBackend {
    data: Vec<u8>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl StorageBackend for MemBackend {
    fn len(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let start: usize = offset.try_into().map_err(|_| MediaError::OffsetOverflow)?;
        let end = start
            .checked_add(buf.len())
            .ok_or(MediaError::OffsetOverflow)?;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// `std::fs::File` backed storage. Writes past the end leave holes on filesystems that
/// support sparse files.
#[derive(Debug)]
pub struct StdFileBackend {
    file: File,
    path: PathBuf,
}

impl StdFileBackend {
    /// Creates (or truncates) `path` for writing.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| MediaError::Io(format!("create {}: {e}", path.display())))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn io_err(&self, op: &str, err: std::io::Error) -> MediaError {
        MediaError::Io(format!("{op} {}: {err}", self.path.display()))
    }
}

impl StorageBackend for StdFileBackend {
    fn len(&mut self) -> Result<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| self.io_err("stat", e))
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        offset
            .checked_add(buf.len() as u64)
            .ok_or(MediaError::OffsetOverflow)?;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.io_err("seek", e))?;
        self.file
            .write_all(buf)
            .map_err(|e| self.io_err("write", e))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| self.io_err("flush", e))
    }
}
