//! ConnectionAcceptor port - Interface for the listening socket.
//!
//! The acceptor owns the listening side. Every accepted socket is handed to
//! the admission callback; the bridge never polls for new clients.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use super::Connection;

/// Errors that can occur in acceptor operations.
#[derive(Debug, thiserror::Error)]
pub enum AcceptorError {
    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// `begin` was called twice
    #[error("Acceptor already started")]
    AlreadyStarted,

    /// Other socket error
    #[error("Acceptor I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Callback receiving each newly accepted connection.
///
/// `None` stands for an accept that produced no usable connection; the
/// receiver ignores it.
pub type AdmissionHandler = Arc<dyn Fn(Option<Box<dyn Connection>>) + Send + Sync>;

/// Port for accepting inbound client connections.
pub trait ConnectionAcceptor: Send {
    /// Address the acceptor is listening on.
    fn local_addr(&self) -> Result<SocketAddr, AcceptorError>;

    /// Start accepting, delivering each connection to `on_client`.
    fn begin(&mut self, on_client: AdmissionHandler) -> Result<(), AcceptorError>;

    /// Stop accepting new connections. Already admitted ones are unaffected.
    fn stop(&mut self);
}
