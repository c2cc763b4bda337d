use std::io::{Cursor, Read, Result as IoResult, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::command::{Sink, Source};

/// Memory-backed reader usable as a child's standard input.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: impl Into<Vec<u8>>) -> Self {
        Self {
            cursor: Cursor::new(buf.into()),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl From<MemReader> for Source {
    fn from(reader: MemReader) -> Self {
        Source::reader(reader)
    }
}

/// Memory-backed writer for collecting what a child writes.
///
/// Clones share the same buffer, so a clone kept by the caller can be read
/// once the child has exited.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, handle).
    pub fn with_handle() -> (Self, MemHandle) {
        let mw = MemWriter::new();
        let handle = MemHandle {
            buf: Arc::clone(&mw.buf),
        };
        (mw, handle)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl From<MemWriter> for Sink {
    fn from(writer: MemWriter) -> Self {
        Sink::writer(writer)
    }
}

/// Read side of a [`MemWriter`].
#[derive(Clone, Debug)]
pub struct MemHandle {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemHandle {
    pub fn bytes(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Collected bytes as text, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}
