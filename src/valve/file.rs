//! File-backed valves.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::base::Valve;
use super::source::Source;
use crate::config::ValveConfig;
use crate::error::{Result, ValveError};

/// A valve reading fixed-size chunks from a file.
pub type FileValve = Valve<FileSource>;

/// A file opened read-only for the duration of a valve's open/close cycle.
#[derive(Debug)]
pub struct FileSource {
    /// Path of the file to read
    filepath: PathBuf,
    /// Open handle, present only while the valve is open
    file_handle: Option<File>,
}

impl FileSource {
    /// Create a source for the given path without touching the filesystem.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            file_handle: None,
        }
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// Whether a handle is currently held.
    pub fn is_acquired(&self) -> bool {
        self.file_handle.is_some()
    }
}

impl Source for FileSource {
    fn acquire(&mut self) -> Result<()> {
        let file = File::open(&self.filepath).map_err(|source| {
            debug!(path = %self.filepath.display(), error = %source, "Failed to open file");
            ValveError::ResourceUnavailable {
                path: self.filepath.clone(),
                source,
            }
        })?;

        trace!(path = %self.filepath.display(), "Opened file");
        self.file_handle = Some(file);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if self.file_handle.take().is_some() {
            trace!(path = %self.filepath.display(), "Closed file");
        }
        Ok(())
    }

    fn flow_out(&mut self, chunk_size: usize) -> Result<Option<Vec<u8>>> {
        let file = self.file_handle.as_mut().ok_or(ValveError::NotOpen)?;

        // Keep reading until the chunk is full or the file ends, so only the
        // final chunk can come up short.
        let mut chunk = Vec::with_capacity(chunk_size);
        file.by_ref().take(chunk_size as u64).read_to_end(&mut chunk)?;

        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}

impl Valve<FileSource> {
    /// Create a valve over the file at `filepath`.
    ///
    /// The configuration is validated here; the file is not opened until
    /// [`open`](Valve::open).
    pub fn new(filepath: impl Into<PathBuf>, config: ValveConfig) -> Result<Self> {
        Valve::with_source(FileSource::new(filepath), config)
    }

    pub fn filepath(&self) -> &Path {
        self.source().filepath()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_file(len: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_new_does_not_touch_filesystem() {
        let valve = FileValve::new("/does/not/exist", ValveConfig::default()).unwrap();
        assert!(!valve.is_open());
        assert!(!valve.source().is_acquired());
        assert_eq!(valve.filepath(), Path::new("/does/not/exist"));
    }

    #[test]
    fn test_zero_chunk_size_fails_before_io() {
        let result = FileValve::new(
            "/does/not/exist",
            ValveConfig::default().with_chunk_size(0),
        );
        assert!(matches!(result, Err(ValveError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut valve =
            FileValve::new(dir.path().join("missing.bin"), ValveConfig::default()).unwrap();

        let result = valve.open();

        assert!(matches!(result, Err(ValveError::ResourceUnavailable { .. })));
        assert!(!valve.is_open());
        assert!(!valve.source().is_acquired());
    }

    #[test]
    fn test_flow_out_chunks() {
        let file = write_temp_file(10);
        let mut source = FileSource::new(file.path());
        source.acquire().unwrap();

        assert_eq!(source.flow_out(4).unwrap().map(|c| c.len()), Some(4));
        assert_eq!(source.flow_out(4).unwrap().map(|c| c.len()), Some(4));
        assert_eq!(source.flow_out(4).unwrap().map(|c| c.len()), Some(2));
        assert_eq!(source.flow_out(4).unwrap(), None);
    }

    #[test]
    fn test_flow_out_preserves_content() {
        let file = write_temp_file(300);
        let mut source = FileSource::new(file.path());
        source.acquire().unwrap();

        let mut data = Vec::new();
        while let Some(chunk) = source.flow_out(64).unwrap() {
            data.extend_from_slice(&chunk);
        }

        assert_eq!(data, std::fs::read(file.path()).unwrap());
    }

    #[test]
    fn test_flow_out_empty_file() {
        let file = write_temp_file(0);
        let mut source = FileSource::new(file.path());
        source.acquire().unwrap();

        assert_eq!(source.flow_out(1024).unwrap(), None);
    }

    #[test]
    fn test_flow_out_requires_acquire() {
        let file = write_temp_file(8);
        let mut source = FileSource::new(file.path());
        assert!(matches!(source.flow_out(4), Err(ValveError::NotOpen)));
    }

    #[test]
    fn test_release_drops_handle() {
        let file = write_temp_file(8);
        let mut source = FileSource::new(file.path());

        source.acquire().unwrap();
        assert!(source.is_acquired());

        source.release().unwrap();
        assert!(!source.is_acquired());
    }
}
