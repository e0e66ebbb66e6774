//! Method descriptors and the boxed handler type the core dispatches to.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::context::CallContext;
use super::status::RpcStatus;

/// Per-method authentication requirement, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// No credential required; the identity slot is set to `Anonymous`.
    Public,
    /// Any valid credential.
    Authenticated,
    /// Valid credential belonging to an admin user.
    AdminOnly,
}

/// Identifies one registered RPC method. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Full method name, `<service>/<method>`,
    /// e.g. `golinks.api.v1.ShortcutService/GetShortcut`.
    pub name: String,
    pub access: AccessPolicy,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, access: AccessPolicy) -> Self {
        Self {
            name: name.into(),
            access,
        }
    }
}

pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, RpcStatus>> + Send>>;

/// A registered method body: JSON request in, JSON response or status out.
/// Typed decoding happens inside, at the registration boundary (see `unary`).
pub type MethodHandler =
    Box<dyn Fn(CallContext, serde_json::Value) -> HandlerFuture + Send + Sync>;

/// Wrap a typed async function into a `MethodHandler`. Decodes the request
/// payload into `P` (decode failure is `InvalidArgument`) and encodes the
/// response back to JSON.
pub fn unary<P, R, F, Fut>(f: F) -> MethodHandler
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize,
    F: Fn(CallContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RpcStatus>> + Send + 'static,
{
    Box::new(move |ctx, payload| -> HandlerFuture {
        match serde_json::from_value::<P>(payload) {
            Ok(params) => {
                let fut = f(ctx, params);
                Box::pin(async move {
                    let result = fut.await?;
                    serde_json::to_value(result).map_err(|e| {
                        RpcStatus::internal(format!("Failed to encode response: {}", e))
                    })
                })
            }
            Err(e) => {
                let status = RpcStatus::invalid_argument(format!("Invalid request: {}", e));
                Box::pin(async move { Err(status) })
            }
        }
    })
}
