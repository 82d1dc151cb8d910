//! Client handle - one admitted connection and its liveness.
//!
//! The handle exclusively owns the connection. On creation it subscribes a
//! lifecycle callback that flips the liveness flag on error, disconnect or
//! timeout and appends received bytes to the shared inbound buffer. The
//! callback holds only a weak reference to the handle's state and is
//! unsubscribed when the handle is dropped, so late transport events after
//! destruction are ignored.

use std::sync::{Arc, Weak};

use crate::domain::client::{ClientLiveness, ClientStatus};
use crate::domain::foundation::ClientId;
use crate::domain::inbound::InboundBuffer;
use crate::ports::{Connection, ConnectionEvent, ConnectionEventHandler};

/// An admitted client connection.
pub struct ClientHandle {
    id: ClientId,
    identifier: String,
    liveness: Arc<ClientLiveness>,
    connection: Box<dyn Connection>,
}

impl ClientHandle {
    /// Wrap a freshly accepted connection and install its lifecycle callback.
    pub fn new(mut connection: Box<dyn Connection>, inbound: InboundBuffer) -> Self {
        let id = ClientId::new();
        let identifier = connection.remote_addr();
        let liveness = Arc::new(ClientLiveness::new());

        tracing::info!(client = %identifier, client_id = %id, "New client connected");

        connection.subscribe(lifecycle_handler(
            Arc::downgrade(&liveness),
            inbound,
            identifier.clone(),
        ));

        Self {
            id,
            identifier,
            liveness,
            connection,
        }
    }

    /// Unique ID assigned at admission.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Remote address the client connected from.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ClientStatus {
        self.liveness.status()
    }

    /// Whether the connection has reported an error, disconnect or timeout.
    pub fn is_disconnected(&self) -> bool {
        self.liveness.is_disconnected()
    }

    /// Send bytes to the client. Failures surface through the lifecycle callback.
    pub fn write(&mut self, bytes: &[u8]) {
        self.connection.write(bytes);
    }

    /// Close the underlying connection.
    pub fn close(&mut self, force: bool) {
        self.connection.close(force);
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.connection.unsubscribe();
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("status", &self.status())
            .finish()
    }
}

fn lifecycle_handler(
    liveness: Weak<ClientLiveness>,
    inbound: InboundBuffer,
    identifier: String,
) -> ConnectionEventHandler {
    Arc::new(move |event: ConnectionEvent<'_>| {
        // Handle already destroyed
        let Some(liveness) = liveness.upgrade() else {
            return;
        };

        if event.is_terminal() {
            if liveness.mark_disconnected() {
                tracing::debug!(client = %identifier, event = %event, "Client marked disconnected");
            }
        } else if let ConnectionEvent::Data(bytes) = event {
            if bytes.is_empty() {
                return;
            }
            tracing::debug!(client = %identifier, len = bytes.len(), "Received data from client");
            inbound.append(bytes);
        }
    })
}
