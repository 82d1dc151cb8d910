//! Client registry - owns every admitted client handle.
//!
//! Admission happens on the acceptor's task while reaping and broadcasting
//! happen on the bridge tick, so the handle list sits behind a mutex.
//! Transport callbacks never take this lock; they only touch each handle's
//! liveness flag and the shared inbound buffer.

use parking_lot::Mutex;

use crate::domain::foundation::ClientId;
use crate::domain::inbound::InboundBuffer;
use crate::ports::Connection;

use super::ClientHandle;

/// Ordered collection of admitted clients (insertion order = connection order).
#[derive(Debug)]
pub struct ClientRegistry {
    clients: Mutex<Vec<ClientHandle>>,
    inbound: InboundBuffer,
}

impl ClientRegistry {
    /// Create an empty registry whose clients append to `inbound`.
    pub fn new(inbound: InboundBuffer) -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            inbound,
        }
    }

    /// Admit a newly accepted connection.
    ///
    /// `None` is ignored without creating a handle. Returns the new client's ID.
    pub fn admit(&self, connection: Option<Box<dyn Connection>>) -> Option<ClientId> {
        let connection = connection?;
        let handle = ClientHandle::new(connection, self.inbound.clone());
        let id = handle.id();
        self.clients.lock().push(handle);
        Some(id)
    }

    /// Remove and destroy every client marked disconnected.
    ///
    /// Live clients keep their relative order. Returns how many were reaped.
    pub fn reap(&self) -> usize {
        let dead: Vec<ClientHandle> = {
            let mut clients = self.clients.lock();
            let (live, dead): (Vec<_>, Vec<_>) =
                clients.drain(..).partition(|client| !client.is_disconnected());
            *clients = live;
            dead
        };

        for client in &dead {
            tracing::info!(client = %client.identifier(), client_id = %client.id(), "Client disconnected");
        }

        dead.len()
    }

    /// Apply `f` to every live client in registry order.
    ///
    /// Returns the number of clients visited.
    pub fn for_each_live<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&mut ClientHandle),
    {
        let mut clients = self.clients.lock();
        let mut visited = 0;
        for client in clients.iter_mut().filter(|c| !c.is_disconnected()) {
            f(client);
            visited += 1;
        }
        visited
    }

    /// Force-close and destroy every remaining client.
    ///
    /// Does not wait for close acknowledgements; those arrive at callbacks
    /// that are already unsubscribed. Returns how many clients were closed.
    pub fn shutdown(&self) -> usize {
        let mut clients = std::mem::take(&mut *self.clients.lock());
        for client in clients.iter_mut() {
            client.close(true);
        }
        let closed = clients.len();
        drop(clients);
        closed
    }

    /// Number of clients currently held, live or awaiting reaping.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no clients are held.
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Remote addresses of all held clients, in registry order.
    pub fn identifiers(&self) -> Vec<String> {
        self.clients
            .lock()
            .iter()
            .map(|c| c.identifier().to_string())
            .collect()
    }
}
