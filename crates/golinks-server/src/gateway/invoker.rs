//! Invocation strategies. Translators invoke methods through one trait; in
//! production the REST translator dials the native listener over loopback
//! while the browser adapter calls the core in-process. Tests can swap in
//! either.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::native::{CallOutcome, NativeClient};
use crate::rpc::{CallContext, RpcCore, RpcStatus};

#[async_trait::async_trait]
pub trait CoreInvoker: Send + Sync {
    async fn invoke(
        &self,
        method: &str,
        metadata: HashMap<String, String>,
        payload: serde_json::Value,
    ) -> Result<CallOutcome, RpcStatus>;
}

/// Calls through the native protocol over a loopback connection, so REST
/// traffic exercises the same wire path as external native callers.
pub struct RemoteInvoker {
    client: NativeClient,
}

impl RemoteInvoker {
    pub fn new(client: NativeClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CoreInvoker for RemoteInvoker {
    async fn invoke(
        &self,
        method: &str,
        metadata: HashMap<String, String>,
        payload: serde_json::Value,
    ) -> Result<CallOutcome, RpcStatus> {
        self.client.call(method, metadata, payload).await
    }
}

/// Calls the core directly in-process. Used by the browser adapter, which
/// already lives in the same process as the core.
pub struct LocalInvoker {
    core: Arc<RpcCore>,
}

impl LocalInvoker {
    pub fn new(core: Arc<RpcCore>) -> Self {
        Self { core }
    }
}

#[async_trait::async_trait]
impl CoreInvoker for LocalInvoker {
    async fn invoke(
        &self,
        method: &str,
        metadata: HashMap<String, String>,
        payload: serde_json::Value,
    ) -> Result<CallOutcome, RpcStatus> {
        let mut ctx = CallContext::new(metadata, CancellationToken::new());
        let payload = self.core.invoke(method, payload, &mut ctx).await?;
        Ok(CallOutcome {
            payload,
            metadata: ctx.response_metadata(),
            trailers: ctx.trailers(),
        })
    }
}
