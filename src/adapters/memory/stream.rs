//! In-memory byte stream for testing.
//!
//! Stands in for a serial device: tests push bytes the "device" produced
//! through the probe and read back every block the bridge wrote.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ports::ByteStream;

#[derive(Debug, Default)]
struct StreamState {
    incoming: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
}

/// In-memory [`ByteStream`].
///
/// # Example
///
/// ```ignore
/// let (stream, probe) = InMemoryStream::new();
/// let mut bridge = StreamBridge::new(Box::new(stream));
///
/// probe.push(b"hello");
/// bridge.tick();
/// assert_eq!(probe.writes(), vec![b"ping".to_vec()]);
/// ```
#[derive(Debug)]
pub struct InMemoryStream {
    state: Arc<Mutex<StreamState>>,
}

/// Test-side handle to an [`InMemoryStream`].
#[derive(Debug, Clone)]
pub struct InMemoryStreamProbe {
    state: Arc<Mutex<StreamState>>,
}

impl InMemoryStream {
    /// Creates an empty stream and its probe.
    pub fn new() -> (Self, InMemoryStreamProbe) {
        let state = Arc::new(Mutex::new(StreamState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            InMemoryStreamProbe { state },
        )
    }
}

impl ByteStream for InMemoryStream {
    fn available(&self) -> usize {
        self.state.lock().incoming.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut state = self.state.lock();
        let len = buf.len().min(state.incoming.len());
        for (dst, src) in buf.iter_mut().zip(state.incoming.drain(..len)) {
            *dst = src;
        }
        len
    }

    fn write(&mut self, bytes: &[u8]) {
        self.state.lock().writes.push(bytes.to_vec());
    }
}

impl InMemoryStreamProbe {
    // === Test Helpers ===

    /// Queue bytes as if the device had produced them.
    pub fn push(&self, bytes: &[u8]) {
        self.state.lock().incoming.extend(bytes);
    }

    /// Bytes still waiting to be read by the bridge.
    pub fn available(&self) -> usize {
        self.state.lock().incoming.len()
    }

    /// Every block written to the stream, one entry per `write` call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }
}
