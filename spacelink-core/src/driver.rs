//! In-memory driver for tests, tooling and loopback setups

use crate::error::LinkError;
use crate::interface::LinkDriver;
use parking_lot::Mutex;

#[cfg(feature = "logging")]
use tracing::warn;

#[derive(Debug, Default)]
struct Inner {
    written: Vec<u8>,
    writes: usize,
    failure: Option<LinkError>,
    reported: Vec<LinkError>,
}

/// Driver that appends everything written to an internal buffer.
///
/// Can be told to accept at most `max_chunk` bytes per write, to exercise
/// partial writes, and to fail writes with a given error.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    inner: Mutex<Inner>,
    max_chunk: Option<usize>,
}

impl MemoryDriver {
    /// Driver that accepts every write in full
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver that accepts at most `max_chunk` bytes per write
    pub fn with_max_chunk(max_chunk: usize) -> Self {
        Self {
            inner: Mutex::default(),
            max_chunk: Some(max_chunk),
        }
    }

    /// Make every following write fail with `error`; `None` heals the driver
    pub fn fail_with(&self, error: Option<LinkError>) {
        self.inner.lock().failure = error;
    }

    /// Copy of everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().written.clone()
    }

    /// Take everything written so far, leaving the buffer empty
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.inner.lock().written)
    }

    /// Number of `write` calls that accepted bytes
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    /// Errors handed to [`LinkDriver::report_error`]
    pub fn reported(&self) -> Vec<LinkError> {
        self.inner.lock().reported.clone()
    }
}

impl LinkDriver for MemoryDriver {
    fn write(&self, data: &[u8]) -> Result<usize, LinkError> {
        let mut inner = self.inner.lock();
        if let Some(error) = &inner.failure {
            return Err(error.clone());
        }

        let n = self.max_chunk.map_or(data.len(), |max| data.len().min(max));
        inner.written.extend_from_slice(&data[..n]);
        inner.writes += 1;
        Ok(n)
    }

    fn report_error(&self, error: &LinkError) {
        #[cfg(feature = "logging")]
        warn!("Memory driver error: {}", error);
        self.inner.lock().reported.push(error.clone());
    }
}
