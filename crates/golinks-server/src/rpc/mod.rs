//! Encoding-agnostic RPC layer.
//!
//! One [`RpcCore`] holds every registered method plus the interceptor
//! chain (logging, then authentication). The wire adapters each feed it:
//!
//! - **Native listener**: length-prefixed frames on a TCP port
//! - **REST translator**: HTTP/JSON under `/api/v1`
//! - **Browser framing**: framed HTTP under `golinks.api.v1.*` paths
//!
//! Auth therefore runs exactly once per call, at this boundary, whatever
//! encoding carried the request.

pub mod context;
pub mod core;
pub mod interceptor;
pub mod method;
pub mod status;

pub use context::CallContext;
pub use core::{MethodInfo, RpcCore};
pub use interceptor::{AuthInterceptor, Interceptor, LoggerInterceptor, ACCESS_TOKEN_COOKIE};
pub use method::{unary, AccessPolicy, MethodDescriptor, MethodHandler};
pub use status::{RpcCode, RpcStatus};
