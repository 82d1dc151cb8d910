//! In-memory client connection for testing.
//!
//! Lets tests play the transport: fire error, disconnect, timeout and data
//! events at whatever moment they like, make writes fail, and inspect what
//! the bridge sent, how the connection was closed and how often it was
//! released.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ports::{Connection, ConnectionEvent, ConnectionEventHandler};

#[derive(Default)]
struct ConnectionState {
    handler: Option<ConnectionEventHandler>,
    written: Vec<u8>,
    write_sizes: Vec<usize>,
    fail_writes: bool,
    closed: Option<bool>,
    released: usize,
}

/// In-memory [`Connection`].
pub struct InMemoryConnection {
    remote: String,
    state: Arc<Mutex<ConnectionState>>,
}

/// Test-side handle to an [`InMemoryConnection`].
///
/// Outlives the connection, so tests can keep firing events after the
/// bridge destroyed its handle.
#[derive(Clone)]
pub struct InMemoryConnectionProbe {
    state: Arc<Mutex<ConnectionState>>,
}

impl InMemoryConnection {
    /// Creates a connection from `remote` and its probe.
    pub fn new(remote: impl Into<String>) -> (Self, InMemoryConnectionProbe) {
        let state = Arc::new(Mutex::new(ConnectionState::default()));
        (
            Self {
                remote: remote.into(),
                state: Arc::clone(&state),
            },
            InMemoryConnectionProbe { state },
        )
    }
}

impl Connection for InMemoryConnection {
    fn remote_addr(&self) -> String {
        self.remote.clone()
    }

    fn write(&mut self, bytes: &[u8]) {
        let failing = {
            let mut state = self.state.lock();
            if state.closed.is_some() {
                return;
            }
            if !state.fail_writes {
                state.written.extend_from_slice(bytes);
                state.write_sizes.push(bytes.len());
            }
            state.fail_writes
        };

        if failing {
            emit(&self.state, ConnectionEvent::Error(io::ErrorKind::BrokenPipe));
        }
    }

    fn close(&mut self, force: bool) {
        self.state.lock().closed = Some(force);
    }

    fn subscribe(&mut self, handler: ConnectionEventHandler) {
        self.state.lock().handler = Some(handler);
    }

    fn unsubscribe(&mut self) {
        self.state.lock().handler = None;
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.state.lock().released += 1;
    }
}

fn emit(state: &Mutex<ConnectionState>, event: ConnectionEvent<'_>) {
    // Clone out so the handler runs without our lock held.
    let handler = state.lock().handler.clone();
    if let Some(handler) = handler {
        handler(event);
    }
}

impl InMemoryConnectionProbe {
    // === Test Helpers ===

    /// Fire an event at the subscribed handler, if any.
    pub fn emit(&self, event: ConnectionEvent<'_>) {
        emit(&self.state, event);
    }

    /// Fire a data event carrying `bytes`.
    pub fn send(&self, bytes: &[u8]) {
        self.emit(ConnectionEvent::Data(bytes));
    }

    /// Make every later write fail with a broken-pipe error event.
    pub fn fail_writes(&self) {
        self.state.lock().fail_writes = true;
    }

    /// The currently subscribed handler.
    pub fn handler(&self) -> Option<ConnectionEventHandler> {
        self.state.lock().handler.clone()
    }

    /// Whether a handler is subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.state.lock().handler.is_some()
    }

    /// All bytes written to the connection.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Size of each successful write, in order.
    pub fn write_sizes(&self) -> Vec<usize> {
        self.state.lock().write_sizes.clone()
    }

    /// `Some(force)` once closed.
    pub fn closed(&self) -> Option<bool> {
        self.state.lock().closed
    }

    /// How many times the connection resource was dropped.
    pub fn release_count(&self) -> usize {
        self.state.lock().released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn events_reach_subscribed_handler() {
        let (mut connection, probe) = InMemoryConnection::new("a:1");
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        connection.subscribe(Arc::new(move |_event: ConnectionEvent<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        probe.send(b"x");
        probe.emit(ConnectionEvent::Disconnected);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        connection.unsubscribe();
        probe.send(b"y");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn writes_after_close_are_dropped() {
        let (mut connection, probe) = InMemoryConnection::new("a:1");
        connection.write(b"ab");
        connection.close(false);
        connection.write(b"cd");

        assert_eq!(probe.written(), b"ab".to_vec());
        assert_eq!(probe.closed(), Some(false));
    }

    #[test]
    fn drop_counts_release() {
        let (connection, probe) = InMemoryConnection::new("a:1");
        assert_eq!(probe.release_count(), 0);
        drop(connection);
        assert_eq!(probe.release_count(), 1);
    }
}
