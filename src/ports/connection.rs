//! Connection port - Interface for one accepted network client.
//!
//! A connection is owned by exactly one client handle. The transport reports
//! what happens on the socket through a single subscribed event handler, which
//! may run on any thread at any time relative to the bridge tick.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Asynchronous event raised by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent<'a> {
    /// The transport failed (read, write or socket error).
    Error(io::ErrorKind),

    /// The peer closed the connection, or the connection was closed locally.
    Disconnected,

    /// The connection stayed idle longer than the transport allows.
    Timeout(Duration),

    /// Bytes received from the peer.
    Data(&'a [u8]),
}

impl ConnectionEvent<'_> {
    /// Whether this event ends the connection's useful life.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConnectionEvent::Data(_))
    }
}

impl fmt::Display for ConnectionEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Error(kind) => write!(f, "error ({})", kind),
            ConnectionEvent::Disconnected => write!(f, "disconnect"),
            ConnectionEvent::Timeout(idle) => write!(f, "timeout after {:?}", idle),
            ConnectionEvent::Data(bytes) => write!(f, "data ({} bytes)", bytes.len()),
        }
    }
}

/// Callback installed on a connection. Shared so adapters can hand copies to
/// their I/O tasks.
pub type ConnectionEventHandler = Arc<dyn Fn(ConnectionEvent<'_>) + Send + Sync>;

/// Port for a single accepted client connection.
///
/// Implementations should:
/// - Never block in `write` or `close`
/// - Report send failures through the subscribed handler rather than returning them
/// - Stop invoking the handler once `unsubscribe` returns
pub trait Connection: Send {
    /// Display identifier for the peer (typically `ip:port`).
    fn remote_addr(&self) -> String;

    /// Queue bytes for the peer. Fire-and-forget.
    fn write(&mut self, bytes: &[u8]);

    /// Close the connection. `force` drops it without flushing queued bytes.
    fn close(&mut self, force: bool);

    /// Install the event handler, replacing any previous one.
    fn subscribe(&mut self, handler: ConnectionEventHandler);

    /// Remove the event handler. Later events are dropped.
    fn unsubscribe(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_is_non_terminal() {
        assert!(!ConnectionEvent::Data(b"x").is_terminal());
        assert!(ConnectionEvent::Disconnected.is_terminal());
        assert!(ConnectionEvent::Timeout(Duration::from_secs(1)).is_terminal());
        assert!(ConnectionEvent::Error(io::ErrorKind::BrokenPipe).is_terminal());
    }

    #[test]
    fn display_describes_event() {
        assert_eq!(ConnectionEvent::Data(b"abc").to_string(), "data (3 bytes)");
        assert_eq!(ConnectionEvent::Disconnected.to_string(), "disconnect");
    }
}
