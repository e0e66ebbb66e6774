//! Interceptors applied by the core to every call, whatever encoding
//! carried it. Order matters: the logger runs first so auth rejections are
//! recorded like any other outcome.

use std::sync::Arc;

use golinks_core::auth::{Identity, TokenVerifier};

use super::context::CallContext;
use super::method::{AccessPolicy, MethodDescriptor};
use super::status::RpcStatus;

/// Cookie carrying the access token for browser clients. Translators
/// forward the whole `cookie` header so the interceptor can find it.
pub const ACCESS_TOKEN_COOKIE: &str = "golinks.access-token";

#[async_trait::async_trait]
pub trait Interceptor: Send + Sync {
    /// Runs before the method body. Returning an error aborts the call.
    async fn before(
        &self,
        descriptor: &MethodDescriptor,
        ctx: &mut CallContext,
    ) -> Result<(), RpcStatus>;

    /// Observes the final outcome. Must not fail.
    fn after(&self, _descriptor: &MethodDescriptor, _result: &Result<serde_json::Value, RpcStatus>) {
    }
}

/// Records every call outcome. Successes at debug, failures at warn with
/// the status code.
pub struct LoggerInterceptor;

#[async_trait::async_trait]
impl Interceptor for LoggerInterceptor {
    async fn before(
        &self,
        descriptor: &MethodDescriptor,
        _ctx: &mut CallContext,
    ) -> Result<(), RpcStatus> {
        tracing::debug!(method = %descriptor.name, "RPC call started");
        Ok(())
    }

    fn after(&self, descriptor: &MethodDescriptor, result: &Result<serde_json::Value, RpcStatus>) {
        match result {
            Ok(_) => tracing::debug!(method = %descriptor.name, "RPC call finished"),
            Err(status) => tracing::warn!(
                method = %descriptor.name,
                code = status.code.as_str(),
                message = %status.message,
                "RPC call failed"
            ),
        }
    }
}

/// The single authentication gate. Extracts a credential (bearer token
/// first, then the access-token cookie), verifies it, and populates the
/// context identity. Public methods skip verification but still get an
/// explicit `Anonymous` identity.
pub struct AuthInterceptor {
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthInterceptor {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    fn extract_credential(ctx: &CallContext) -> Option<String> {
        if let Some(token) = ctx.bearer_token() {
            return Some(token.to_string());
        }
        ctx.cookie(ACCESS_TOKEN_COOKIE).map(|v| v.to_string())
    }
}

#[async_trait::async_trait]
impl Interceptor for AuthInterceptor {
    async fn before(
        &self,
        descriptor: &MethodDescriptor,
        ctx: &mut CallContext,
    ) -> Result<(), RpcStatus> {
        if descriptor.access == AccessPolicy::Public {
            ctx.set_identity(Identity::Anonymous);
            return Ok(());
        }

        let raw = Self::extract_credential(ctx)
            .ok_or_else(|| RpcStatus::unauthenticated("Missing access token"))?;

        let identity = self.verifier.verify(&raw).await?;

        if descriptor.access == AccessPolicy::AdminOnly && !identity.is_admin() {
            return Err(RpcStatus::permission_denied("Admin role required"));
        }

        ctx.set_identity(identity);
        Ok(())
    }
}
