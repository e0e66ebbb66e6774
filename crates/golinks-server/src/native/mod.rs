//! The native binary RPC surface: length-prefixed JSON envelopes over TCP.
//!
//! This is both a public surface (CLI tooling dials it directly) and the
//! loopback transport the REST translator uses to reach the core.

pub mod client;
pub mod frame;
pub mod server;

pub use client::{CallOutcome, NativeClient};
pub use frame::{Envelope, WireStatus, MAX_FRAME_LEN};
pub use server::start_native_server;
