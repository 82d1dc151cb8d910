//! Stream Bridge - serial-style byte stream to TCP fan-out/fan-in bridge
//!
//! Bytes read from one stream (typically a UART) are broadcast to every
//! connected TCP client, and bytes from any client are merged back onto the
//! stream. The bridge runs as a periodic tick: reap dead clients, broadcast
//! stream data, flush client input.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod runtime;

pub use error::AppError;
