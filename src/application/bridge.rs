//! StreamBridge - the per-tick relay between the byte stream and the clients.
//!
//! One tick runs, in order:
//! 1. **Reap** clients whose connection reported an error, disconnect or timeout
//! 2. **Read** everything the stream has available and broadcast it to live clients
//! 3. **Write** everything clients sent since the last tick to the stream
//!
//! Reaping always comes first so that a client observed dead never receives
//! another write. None of the steps block.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::inbound::InboundBuffer;
use crate::ports::{AcceptorError, AdmissionHandler, ByteStream, Connection, ConnectionAcceptor};

use super::ClientRegistry;

/// Largest chunk read from the stream and broadcast in one pass.
pub const READ_CHUNK_SIZE: usize = 1024;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Clients removed by the reaper.
    pub reaped: usize,
    /// Bytes read from the stream and broadcast.
    pub broadcast: usize,
    /// Bytes flushed from the inbound buffer to the stream.
    pub flushed: usize,
    /// Clients held after the tick.
    pub clients: usize,
}

impl TickReport {
    /// True when the tick moved no bytes and reaped nobody.
    pub fn is_idle(&self) -> bool {
        self.reaped == 0 && self.broadcast == 0 && self.flushed == 0
    }
}

/// Bridges one byte stream to every admitted client.
pub struct StreamBridge {
    stream: Box<dyn ByteStream>,
    registry: Arc<ClientRegistry>,
    inbound: InboundBuffer,
}

impl StreamBridge {
    /// Create a bridge over `stream` with no clients.
    pub fn new(stream: Box<dyn ByteStream>) -> Self {
        let inbound = InboundBuffer::new();
        Self {
            stream,
            registry: Arc::new(ClientRegistry::new(inbound.clone())),
            inbound,
        }
    }

    /// The client registry.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// The buffer holding client input not yet flushed to the stream.
    pub fn inbound(&self) -> &InboundBuffer {
        &self.inbound
    }

    /// Callback that admits connections into this bridge's registry.
    pub fn admission_handler(&self) -> AdmissionHandler {
        let registry = Arc::clone(&self.registry);
        Arc::new(move |connection: Option<Box<dyn Connection>>| {
            registry.admit(connection);
        })
    }

    /// Start `acceptor` feeding this bridge and log the listening address.
    pub fn setup(&self, acceptor: &mut dyn ConnectionAcceptor) -> Result<SocketAddr, AcceptorError> {
        tracing::info!("Setting up stream bridge...");
        acceptor.begin(self.admission_handler())?;
        let addr = acceptor.local_addr()?;
        self.dump_config(addr);
        Ok(addr)
    }

    /// Log the operator-facing configuration.
    pub fn dump_config(&self, addr: SocketAddr) {
        tracing::info!("Stream bridge:");
        tracing::info!("  Address: {}:{}", addr.ip(), addr.port());
    }

    /// Run one reap → read → write iteration.
    pub fn tick(&mut self) -> TickReport {
        let reaped = self.registry.reap();
        let broadcast = self.read();
        let flushed = self.write();

        TickReport {
            reaped,
            broadcast,
            flushed,
            clients: self.registry.len(),
        }
    }

    /// Drain the stream into every live client, one bounded chunk at a time.
    ///
    /// Returns the number of bytes broadcast.
    pub fn read(&mut self) -> usize {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut total = 0;

        loop {
            let available = self.stream.available();
            if available == 0 {
                break;
            }

            let len = self.stream.read(&mut chunk[..available.min(READ_CHUNK_SIZE)]);
            // stream reported bytes it could not deliver
            if len == 0 {
                break;
            }

            tracing::debug!(len, "Received data from stream");
            let data = &chunk[..len];
            self.registry.for_each_live(|client| client.write(data));
            total += len;
        }

        total
    }

    /// Flush all pending client input to the stream as a single block.
    ///
    /// Returns the number of bytes flushed.
    pub fn write(&mut self) -> usize {
        let pending = self.inbound.drain();
        if pending.is_empty() {
            return 0;
        }

        tracing::debug!(len = pending.len(), "Writing data to stream");
        self.stream.write(&pending);
        pending.len()
    }

    /// Force-close every client. Returns how many were closed.
    pub fn shutdown(&self) -> usize {
        self.registry.shutdown()
    }
}
