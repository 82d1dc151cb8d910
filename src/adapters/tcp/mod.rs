//! TCP adapters built on tokio.
//!
//! - [`TcpAcceptor`] - listening socket implementing `ConnectionAcceptor`
//! - [`TcpConnection`] - one accepted client implementing `Connection`

mod acceptor;
mod connection;

pub use acceptor::TcpAcceptor;
pub use connection::TcpConnection;
