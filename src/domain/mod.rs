//! Domain layer containing the bridge's state types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, state machine trait, errors)
//! - `client` - Client lifecycle status and the liveness flag shared with callbacks
//! - `inbound` - The buffer that merges all client input before it reaches the stream

pub mod client;
pub mod foundation;
pub mod inbound;
