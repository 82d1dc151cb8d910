//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the bridge and the outside world. Adapters implement these ports.
//!
//! ## Stream Port
//!
//! - `ByteStream` - The serial-style data stream (poll, bounded read, queued write)
//!
//! ## Network Ports
//!
//! - `ConnectionAcceptor` - Listening socket delivering new connections
//! - `Connection` - One client connection with asynchronous event callbacks

mod acceptor;
mod byte_stream;
mod connection;

pub use acceptor::{AcceptorError, AdmissionHandler, ConnectionAcceptor};
pub use byte_stream::{ByteStream, StreamError};
pub use connection::{Connection, ConnectionEvent, ConnectionEventHandler};
