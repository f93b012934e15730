//! The buffered file handle: read/write/seek/truncate over an in-memory
//! copy of a file's contents, with upload-on-close for writable modes.

use std::io::SeekFrom;
use std::sync::Arc;

use dsdrive_catalog::{split_path, NodeStore, ResolveOutcome};

use crate::engine::{ChunkedObjectEngine, FileSource};
use crate::error::EngineError;
use crate::Result;

/// A buffered bytes container with mode flags derived from a POSIX-like
/// mode string (`r`, `r+`, `w`, `w+`, `x`, `a`, `a+`; `b` is always
/// implied, `t` is rejected).
pub struct FileHandle<S: NodeStore> {
    path: String,
    engine: Arc<ChunkedObjectEngine<S>>,
    buffer: Vec<u8>,
    pos: usize,
    readable: bool,
    writable: bool,
    closed: bool,
}

impl<S: NodeStore> FileHandle<S> {
    /// Opens `path` in `mode` against `engine`. Downloads the existing
    /// contents for any mode that reads or appends; zero-length files
    /// are downloaded too, but resolve to an empty buffer immediately
    /// since `download_file` skips renewal and dispatch for them.
    pub async fn open(engine: Arc<ChunkedObjectEngine<S>>, path: &str, mode: &str) -> Result<Self> {
        if mode.contains('t') {
            return Err(EngineError::Unsupported("text mode"));
        }

        if mode.contains('x') {
            let segments = split_path(path);
            if let ResolveOutcome::Found(_) = engine.catalog().resolve(&segments).await? {
                return Err(EngineError::AlreadyExists);
            }
        }

        let needs_download = mode.contains('r') || mode.contains('a');
        let buffer = if needs_download {
            match engine.download_file(path).await {
                Ok(bytes) => bytes,
                Err(EngineError::NotFound) if mode.contains('a') => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        let mut readable = false;
        let mut writable = false;
        if mode.contains('r') {
            readable = true;
            if mode.contains('+') {
                writable = true;
            }
        }
        if mode.contains('w') {
            writable = true;
            if mode.contains('+') {
                readable = true;
            }
        }
        if mode.contains('x') {
            writable = true;
        }
        if mode.contains('a') {
            writable = true;
            if mode.contains('+') {
                readable = true;
            }
        }

        let pos = if mode.contains('a') { buffer.len() } else { 0 };

        Ok(Self {
            path: path.to_string(),
            engine,
            buffer,
            pos,
            readable,
            writable,
            closed: false,
        })
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn tell(&self) -> u64 {
        self.pos as u64
    }

    /// Reads up to `size` bytes from the current position, or to EOF if
    /// `size` is `None`.
    pub fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
        if !self.readable {
            return Err(EngineError::NotReadable);
        }
        let start = self.pos.min(self.buffer.len());
        let end = match size {
            Some(n) => (start + n).min(self.buffer.len()),
            None => self.buffer.len(),
        };
        let out = self.buffer[start..end].to_vec();
        self.pos = end;
        Ok(out)
    }

    /// Writes `data` at the current position, zero-filling any gap if
    /// the position is past the current end of the buffer.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.writable {
            return Err(EngineError::NotWritable);
        }
        let end = self.pos + data.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(data.len())
    }

    pub fn seek(&mut self, from: SeekFrom) -> Result<u64> {
        let new_pos = match from {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::Current(d) => self.pos as i64 + d,
            SeekFrom::End(d) => self.buffer.len() as i64 + d,
        };
        if new_pos < 0 {
            return Err(EngineError::InvalidSeek);
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    /// Extends the buffer with zero bytes, or discards its tail,
    /// leaving the position where it was (even if that is now past the
    /// new end).
    pub fn truncate(&mut self, size: usize) -> Result<usize> {
        if size < self.buffer.len() {
            self.buffer.truncate(size);
        } else if size > self.buffer.len() {
            self.buffer.resize(size, 0);
        }
        Ok(size)
    }

    /// Closes the handle. Writable handles trigger a full re-upload of
    /// the buffer via the engine before it is released.
    pub async fn close(mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.writable {
            let buffer = std::mem::take(&mut self.buffer);
            self.engine
                .send_file(&self.path, FileSource::Bytes(buffer))
                .await?;
        }
        Ok(())
    }
}
