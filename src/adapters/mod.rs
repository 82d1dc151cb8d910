//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the bridge to external systems:
//! - `tcp` - Listening socket and client connections (tokio)
//! - `stream` - The serial-style byte stream (tokio async I/O)
//! - `memory` - Deterministic in-memory doubles for tests

pub mod memory;
pub mod stream;
pub mod tcp;

pub use memory::{InMemoryConnection, InMemoryConnectionProbe, InMemoryStream, InMemoryStreamProbe};
pub use stream::AsyncIoStream;
pub use tcp::{TcpAcceptor, TcpConnection};
