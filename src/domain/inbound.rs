//! Shared inbound buffer.
//!
//! Every client's data callback appends here; the write path drains it to the
//! stream once per tick. Appends and drains may race, so the bytes live behind
//! a mutex and a drain swaps the whole vector out under the lock.

use std::sync::Arc;

use parking_lot::Mutex;

/// Capacity reserved for the buffer at creation and after every drain.
pub const INBOUND_BUFFER_CAPACITY: usize = 1024;

/// Byte buffer merging input from all clients.
///
/// Cloning yields another handle to the same buffer.
#[derive(Debug, Clone)]
pub struct InboundBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl InboundBuffer {
    /// Create an empty buffer with the default reserved capacity.
    pub fn new() -> Self {
        Self {
            bytes: Arc::new(Mutex::new(Vec::with_capacity(INBOUND_BUFFER_CAPACITY))),
        }
    }

    /// Append bytes verbatim. An empty slice is a no-op.
    pub fn append(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.bytes.lock().extend_from_slice(data);
    }

    /// Take everything accumulated so far, leaving the buffer empty.
    pub fn drain(&self) -> Vec<u8> {
        let mut bytes = self.bytes.lock();
        if bytes.is_empty() {
            return Vec::new();
        }
        std::mem::replace(&mut *bytes, Vec::with_capacity(INBOUND_BUFFER_CAPACITY))
    }

    /// Number of bytes waiting for the next flush.
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Whether nothing is waiting for the next flush.
    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Default for InboundBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn append_then_drain_returns_bytes_in_order() {
        let buffer = InboundBuffer::new();
        buffer.append(b"pi");
        buffer.append(b"ng");

        assert_eq!(buffer.drain(), b"ping".to_vec());
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_append_is_noop() {
        let buffer = InboundBuffer::new();
        buffer.append(&[]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn drain_on_empty_buffer_returns_empty() {
        let buffer = InboundBuffer::new();
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let buffer = InboundBuffer::new();
        let writer = buffer.clone();
        writer.append(b"abc");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn concurrent_appends_keep_per_writer_order() {
        let buffer = InboundBuffer::new();
        let writers: Vec<_> = [b'a', b'b', b'c']
            .into_iter()
            .map(|tag| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for i in 0..100u8 {
                        buffer.append(&[tag, i]);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let drained = buffer.drain();
        assert_eq!(drained.len(), 600);
        for tag in [b'a', b'b', b'c'] {
            let seq: Vec<u8> = drained
                .chunks(2)
                .filter(|pair| pair[0] == tag)
                .map(|pair| pair[1])
                .collect();
            assert_eq!(seq, (0..100u8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn drains_racing_appends_lose_nothing() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let buffer = InboundBuffer::new();
        let done = Arc::new(AtomicBool::new(false));

        let drainer = {
            let buffer = buffer.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut collected = Vec::new();
                while !done.load(Ordering::Acquire) {
                    collected.extend(buffer.drain());
                    thread::yield_now();
                }
                collected
            })
        };

        let writers: Vec<_> = [b'a', b'b', b'c', b'd']
            .into_iter()
            .map(|tag| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for i in 0..250u16 {
                        let [hi, lo] = i.to_be_bytes();
                        buffer.append(&[tag, hi, lo]);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        done.store(true, Ordering::Release);

        let mut collected = drainer.join().unwrap();
        collected.extend(buffer.drain());

        assert_eq!(collected.len(), 4 * 250 * 3);
        for tag in [b'a', b'b', b'c', b'd'] {
            let seq: Vec<u16> = collected
                .chunks(3)
                .filter(|triple| triple[0] == tag)
                .map(|triple| u16::from_be_bytes([triple[1], triple[2]]))
                .collect();
            assert_eq!(seq, (0..250u16).collect::<Vec<_>>());
        }
    }
}
