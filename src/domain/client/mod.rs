//! Client lifecycle types.
//!
//! `ClientStatus` is the `Connected → Disconnected` state a client is in;
//! `ClientLiveness` is the thread-safe flag that holds it at runtime.

mod liveness;
mod status;

pub use liveness::ClientLiveness;
pub use status::ClientStatus;
