// src/engine/io.rs
//
// I/O: where a raw image payload comes from.

use crate::engine::common::EngineResult;
use crate::error::NormalizeError;
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Raw image payload - in-memory bytes or a file that is mapped only while it is read
#[derive(Clone, Debug)]
pub enum Source {
    /// In-memory image data (e.g. an upload body)
    Memory(Arc<Vec<u8>>),
    /// File path; mapped on demand, unmapped when the borrow ends
    Path(PathBuf),
}

impl Source {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Source::Memory(Arc::new(data.into()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Source::Path(path.as_ref().to_path_buf())
    }

    /// Get path if this is a Path source
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Source::Path(p) => Some(p.as_path()),
            Source::Memory(_) => None,
        }
    }

    /// Lend the payload bytes to `f`.
    ///
    /// For `Path` sources the file is memory-mapped for the duration of the call
    /// only; the mapping and the file handle are released on every return path.
    pub fn with_bytes<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&[u8]) -> EngineResult<T>,
    {
        match self {
            Source::Memory(data) => f(data.as_slice()),
            Source::Path(path) => {
                let display = path.to_string_lossy().to_string();
                let file = File::open(path).map_err(|e| match e.kind() {
                    ErrorKind::NotFound => NormalizeError::file_not_found(display.clone()),
                    _ => NormalizeError::file_read_failed(display.clone(), e),
                })?;
                let len = file
                    .metadata()
                    .map_err(|e| NormalizeError::file_read_failed(display.clone(), e))?
                    .len();
                // Zero-length mappings are rejected by some platforms
                if len == 0 {
                    return f(&[]);
                }

                // Safety: the file is assumed not to be modified while it is mapped.
                // If it is, decoding may fail or the process may receive SIGBUS.
                let mmap = unsafe {
                    Mmap::map(&file).map_err(|e| NormalizeError::mmap_failed(display, e))?
                };
                f(mmap.as_ref())
            }
        }
    }
}

impl From<Vec<u8>> for Source {
    fn from(data: Vec<u8>) -> Self {
        Source::from_bytes(data)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::from_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_source_lends_its_bytes() {
        let source = Source::from_bytes(vec![1u8, 2, 3]);
        let sum = source
            .with_bytes(|b| Ok(b.iter().map(|&v| v as u32).sum::<u32>()))
            .unwrap();
        assert_eq!(sum, 6);
        assert!(source.as_path().is_none());
    }

    #[test]
    fn path_source_maps_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really an image").unwrap();
        let source = Source::from_path(file.path());
        let len = source.with_bytes(|b| Ok(b.len())).unwrap();
        assert_eq!(len, 19);
        assert_eq!(source.as_path(), Some(file.path()));
    }

    #[test]
    fn path_source_releases_mapping_after_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        let source = Source::from_path(file.path());
        let err = source
            .with_bytes::<(), _>(|_| Err(NormalizeError::decode_failed("rejected")))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::DecodeFailed { .. }));
        // The temp file can still be removed: nothing holds it open.
        file.close().unwrap();
    }

    #[test]
    fn empty_file_yields_empty_slice() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = Source::from_path(file.path());
        assert_eq!(source.with_bytes(|b| Ok(b.len())).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_reported() {
        let source = Source::from_path("/definitely/not/here.jpg");
        let err = source.with_bytes(|b| Ok(b.len())).unwrap_err();
        assert!(matches!(err, NormalizeError::FileNotFound { .. }));
    }
}
