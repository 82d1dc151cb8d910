//! In-memory adapters for testing.
//!
//! Deterministic stand-ins for the serial device and for client sockets.
//! Each adapter comes with a probe that the test keeps after handing the
//! adapter itself to the bridge.

mod connection;
mod stream;

pub use connection::{InMemoryConnection, InMemoryConnectionProbe};
pub use stream::{InMemoryStream, InMemoryStreamProbe};
