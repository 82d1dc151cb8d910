//! Client lifecycle status.

use std::fmt;

/// Lifecycle status of an admitted client connection.
///
/// A client starts `Connected` and moves to `Disconnected` on the first
/// error, disconnect or timeout event. `Disconnected` is terminal; the
/// only thing that happens afterwards is reaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientStatus {
    #[default]
    Connected,
    Disconnected,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientStatus::Connected => write!(f, "connected"),
            ClientStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}
