//! Byte stream adapters.
//!
//! - [`AsyncIoStream`] - device files and stdio through tokio async I/O

mod async_io;

pub use async_io::AsyncIoStream;
