//! ByteStream port - Interface for the serial-style data stream.
//!
//! The bridge polls this once per tick: it asks how many bytes are waiting,
//! reads them in bounded chunks and hands back whatever the clients sent.
//! Implementations must never block; buffering and pacing towards the real
//! device are the adapter's concern.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while opening a stream adapter.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The device or file could not be opened
    #[error("Failed to open stream device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Port for the single byte stream shared by all clients.
///
/// # Example
///
/// ```ignore
/// let mut chunk = [0u8; 1024];
/// while stream.available() > 0 {
///     let n = stream.read(&mut chunk);
///     broadcast(&chunk[..n]);
/// }
/// stream.write(&pending);
/// ```
pub trait ByteStream: Send {
    /// Bytes currently readable without blocking. Zero if none.
    fn available(&self) -> usize;

    /// Consume up to `buf.len()` bytes into `buf`, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue bytes for transmission. Fire-and-forget.
    fn write(&mut self, bytes: &[u8]);
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) {
        (**self).write(bytes)
    }
}
