//! Per-call context: request metadata, resolved identity, response metadata
//! and the cancellation signal derived from the originating connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use golinks_core::auth::Identity;

use super::status::RpcStatus;

/// Context for one in-flight call. Cloning is cheap; clones share the
/// response metadata and the cancellation token, so a handler writing a
/// header is visible to the translator that owns the original.
#[derive(Clone)]
pub struct CallContext {
    /// Request metadata with lowercased keys (HTTP headers or native frame
    /// metadata). Read-only for the lifetime of the call.
    metadata: Arc<HashMap<String, String>>,
    identity: Identity,
    response_metadata: Arc<Mutex<Vec<(String, String)>>>,
    trailers: Arc<Mutex<Vec<(String, String)>>>,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new(metadata: HashMap<String, String>, cancel: CancellationToken) -> Self {
        let metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            metadata: Arc::new(metadata),
            identity: Identity::Anonymous,
            response_metadata: Arc::new(Mutex::new(Vec::new())),
            trailers: Arc::new(Mutex::new(Vec::new())),
            cancel,
        }
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// The bearer token from `authorization: Bearer <token>`, if present.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.metadata("authorization")?;
        let (scheme, token) = value.split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token.trim())
        } else {
            None
        }
    }

    /// A named cookie value parsed out of the forwarded `cookie` metadata.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        let header = self.metadata("cookie")?;
        for pair in header.split(';') {
            if let Some((k, v)) = pair.trim().split_once('=') {
                if k == name {
                    return Some(v);
                }
            }
        }
        None
    }

    /// Identity of the caller. `Anonymous` until the auth interceptor has
    /// run; afterwards always a concrete principal for non-public methods.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    /// The caller's user id, or `Unauthenticated` for anonymous callers.
    pub fn require_user_id(&self) -> Result<i64, RpcStatus> {
        self.identity
            .user_id()
            .ok_or_else(|| RpcStatus::unauthenticated("Authentication required"))
    }

    pub fn add_response_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut m) = self.response_metadata.lock() {
            m.push((key.into(), value.into()));
        }
    }

    pub fn add_trailer(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut t) = self.trailers.lock() {
            t.push((key.into(), value.into()));
        }
    }

    pub fn response_metadata(&self) -> Vec<(String, String)> {
        self.response_metadata
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn trailers(&self) -> Vec<(String, String)> {
        self.trailers.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Whether the originating connection cancelled this call.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
