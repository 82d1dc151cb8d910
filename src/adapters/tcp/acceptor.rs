//! Tokio TCP acceptor.
//!
//! Binds the listening socket up front so bind failures surface at startup,
//! then runs the accept loop on a background task once `begin` is called.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;

use crate::ports::{AcceptorError, AdmissionHandler, Connection, ConnectionAcceptor};

use super::TcpConnection;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening socket handing accepted connections to the bridge.
pub struct TcpAcceptor {
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
    client_timeout: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl TcpAcceptor {
    /// Bind to `addr`.
    ///
    /// `client_timeout` is handed to every accepted connection as its idle
    /// timeout; `None` disables it.
    pub async fn bind(addr: SocketAddr, client_timeout: Option<Duration>) -> Result<Self, AcceptorError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AcceptorError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            local_addr,
            listener: Some(listener),
            client_timeout,
            task: None,
        })
    }
}

impl ConnectionAcceptor for TcpAcceptor {
    fn local_addr(&self) -> Result<SocketAddr, AcceptorError> {
        Ok(self.local_addr)
    }

    fn begin(&mut self, on_client: AdmissionHandler) -> Result<(), AcceptorError> {
        let listener = self.listener.take().ok_or(AcceptorError::AlreadyStarted)?;
        let runtime = Handle::try_current()
            .map_err(|e| AcceptorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        self.task = Some(runtime.spawn(accept_loop(listener, on_client, self.client_timeout)));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TcpAcceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(listener: TcpListener, on_client: AdmissionHandler, client_timeout: Option<Duration>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let connection = TcpConnection::from_stream(stream, client_timeout)
                    .map(|c| Box::new(c) as Box<dyn Connection>);
                on_client(connection);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
