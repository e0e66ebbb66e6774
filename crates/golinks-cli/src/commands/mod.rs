//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! golinks-core domain logic through `AppState`.

pub mod call;
pub mod methods;
pub mod serve;
pub mod token;

use std::sync::Arc;

use golinks_core::state::{AppState, AppStateInner};
use golinks_core::Database;

/// Open a shared `AppState` from the given SQLite database path.
///
/// This mirrors `golinks_server::create_app_state` without starting any
/// listeners, for commands that work on the database directly.
pub async fn init_state(db_path: &str) -> AppState {
    let db = Database::open(db_path).unwrap_or_else(|e| {
        eprintln!("Failed to open database '{}': {}", db_path, e);
        std::process::exit(1);
    });

    let state: AppState = Arc::new(AppStateInner::new(db));

    // Ensure the host admin exists
    if let Err(e) = state
        .ensure_host_user(golinks_server::DEFAULT_HOST_USERNAME)
        .await
    {
        eprintln!("Failed to bootstrap host user: {}", e);
        std::process::exit(1);
    }

    state
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
