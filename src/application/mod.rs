//! Application layer - the bridge runtime.
//!
//! This layer owns the client registry and drives the reap → read → write
//! cycle against the ports. It never touches a concrete transport.
//!
//! - `client_handle` - One admitted connection plus its lifecycle callback
//! - `registry` - Admission, reaping, broadcast iteration and forced shutdown
//! - `bridge` - The per-tick relay between stream and clients
//! - `runner` - Periodic driver with graceful shutdown

mod bridge;
mod client_handle;
mod registry;
mod runner;

pub use bridge::{StreamBridge, TickReport, READ_CHUNK_SIZE};
pub use client_handle::ClientHandle;
pub use registry::ClientRegistry;
pub use runner::{BridgeRunner, BridgeRunnerConfig};
