// LogWire - platform/stream.rs
//
// Concrete output streams for handlers: process stdout/stderr, files, and an
// in-memory buffer. Each stream serialises its own writes behind a mutex so
// several logging threads can share one stream.
//
// Write failures are dropped with a diagnostic; delivery is best-effort.

use crate::core::handler::OutputStream;
use crate::util::error::LogWireError;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Which standard stream a `StdioStream` writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    Stdout,
    Stderr,
}

/// Writes to the process stdout or stderr.
#[derive(Debug)]
pub struct StdioStream {
    target: Stdio,
}

impl StdioStream {
    pub fn new(target: Stdio) -> Self {
        Self { target }
    }
}

impl OutputStream for StdioStream {
    fn write(&self, data: &[u8]) {
        // The std handles carry their own locks.
        let result = match self.target {
            Stdio::Stdout => io::stdout().lock().write_all(data),
            Stdio::Stderr => io::stderr().lock().write_all(data),
        };
        if let Err(e) = result {
            tracing::debug!(target_stream = ?self.target, error = %e, "Dropped stdio write");
        }
    }

    fn flush(&self) {
        let _ = match self.target {
            Stdio::Stdout => io::stdout().flush(),
            Stdio::Stderr => io::stderr().flush(),
        };
    }
}

/// Appends to (or truncates) a file on disk.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileStream {
    /// Open `path` for writing, creating it if needed.
    pub fn open(path: &Path, append: bool) -> Result<Self, LogWireError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| LogWireError::Io {
                path: path.to_path_buf(),
                operation: "open log file",
                source: e,
            })?;
        tracing::debug!(path = %path.display(), append, "Opened file stream");
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputStream for FileStream {
    fn write(&self, data: &[u8]) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = file.write_all(data) {
            tracing::debug!(path = %self.path.display(), error = %e, "Dropped file write");
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = file.flush();
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        let file = self.file.get_mut().unwrap_or_else(PoisonError::into_inner);
        let _ = file.flush();
        tracing::debug!(path = %self.path.display(), "Closed file stream");
    }
}

/// Collects written bytes in memory.
///
/// Useful for tests and for capturing output to be forwarded elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStream {
    buf: Mutex<Vec<u8>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Everything written so far, decoded as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Take and clear the buffer.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl OutputStream for MemoryStream {
    fn write(&self, data: &[u8]) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stream_collects_and_takes() {
        let stream = MemoryStream::new();
        stream.write(b"ab");
        stream.write(b"cd");
        assert_eq!(stream.text(), "abcd");
        assert_eq!(stream.take(), b"abcd");
        assert!(stream.contents().is_empty());
    }

    #[test]
    fn test_file_stream_append_and_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");

        {
            let stream = FileStream::open(&path, true).unwrap();
            stream.write(b"one\n");
        }
        {
            let stream = FileStream::open(&path, true).unwrap();
            stream.write(b"two\n");
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");

        {
            let stream = FileStream::open(&path, false).unwrap();
            stream.write(b"three\n");
            assert_eq!(stream.path(), path.as_path());
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "three\n");
    }

    #[test]
    fn test_file_stream_open_failure_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let err = FileStream::open(&path, true).unwrap_err();
        assert!(matches!(err, LogWireError::Io { .. }));
        assert!(err.to_string().contains("missing"));
    }
}
