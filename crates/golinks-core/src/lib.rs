//! golinks Core — transport-agnostic domain logic for the golinks service.
//!
//! This crate contains the business models, SQLite-backed stores and the
//! access-token machinery. It has **no HTTP framework dependency**, so it can
//! be used from:
//!
//! - the multi-protocol gateway server (via `golinks-server`)
//! - CLI tools that operate on the store directly (`golinks token`)
//! - tests that exercise business methods without any wire encoding

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

// Convenience re-exports
pub use db::Database;
pub use error::ServerError;
pub use state::{AppState, AppStateInner};
