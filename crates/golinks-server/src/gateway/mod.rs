//! The HTTP-facing half of the gateway: pattern table, invocation
//! strategies, the REST translator, the browser-framing adapter and the
//! top-level dispatcher that assembles them into one router.

pub mod dispatch;
pub mod invoker;
pub mod pattern;
pub mod rest;
pub mod web;

use std::collections::HashMap;

use axum::http::HeaderMap;

pub use dispatch::build_router;
pub use invoker::{CoreInvoker, LocalInvoker, RemoteInvoker};
pub use pattern::{BodyMapping, PatternRegistry, PatternRegistryBuilder, VarKind};

/// HTTP headers as call metadata: lowercased names, textual values only.
/// Translators forward this wholesale so the auth interceptor can see
/// `authorization` and `cookie` regardless of encoding.
pub(crate) fn header_metadata(headers: &HeaderMap) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            metadata.insert(name.as_str().to_ascii_lowercase(), value.to_string());
        }
    }
    metadata
}
