//! The encoding-agnostic method registry and dispatch point.
//!
//! Every wire adapter (native listener, REST translator, browser framing)
//! funnels into [`RpcCore::invoke`], so interceptors run exactly once per
//! call no matter which surface received it.

use std::collections::HashMap;

use serde::Serialize;

use super::context::CallContext;
use super::interceptor::Interceptor;
use super::method::{AccessPolicy, MethodDescriptor, MethodHandler};
use super::status::RpcStatus;

struct RegisteredMethod {
    descriptor: MethodDescriptor,
    handler: MethodHandler,
}

/// One entry of the introspection catalogue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub access: AccessPolicy,
}

/// Registry of method implementations plus the interceptor chain applied
/// uniformly to all of them. Built once at startup, then read-only.
pub struct RpcCore {
    methods: HashMap<String, RegisteredMethod>,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl Default for RpcCore {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcCore {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Register a method implementation. Registering two methods under one
    /// full name is a startup configuration error.
    pub fn register(
        &mut self,
        descriptor: MethodDescriptor,
        handler: MethodHandler,
    ) -> Result<(), String> {
        let name = descriptor.name.clone();
        if self.methods.contains_key(&name) {
            return Err(format!("Method {} registered twice", name));
        }
        self.methods
            .insert(name, RegisteredMethod { descriptor, handler });
        Ok(())
    }

    /// The introspection catalogue, sorted by full method name.
    pub fn catalog(&self) -> Vec<MethodInfo> {
        let mut methods: Vec<MethodInfo> = self
            .methods
            .values()
            .map(|m| MethodInfo {
                name: m.descriptor.name.clone(),
                access: m.descriptor.access,
            })
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    /// Dispatch one call: run the interceptor chain, then the method body.
    /// Errors from either are returned verbatim for the translator to
    /// re-encode.
    pub async fn invoke(
        &self,
        method: &str,
        request: serde_json::Value,
        ctx: &mut CallContext,
    ) -> Result<serde_json::Value, RpcStatus> {
        let Some(entry) = self.methods.get(method) else {
            return Err(RpcStatus::not_found(format!(
                "Method {} is not registered",
                method
            )));
        };

        let request = if request.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            request
        };

        let result = self.run(entry, request, ctx).await;
        for interceptor in &self.interceptors {
            interceptor.after(&entry.descriptor, &result);
        }
        result
    }

    async fn run(
        &self,
        entry: &RegisteredMethod,
        request: serde_json::Value,
        ctx: &mut CallContext,
    ) -> Result<serde_json::Value, RpcStatus> {
        for interceptor in &self.interceptors {
            interceptor.before(&entry.descriptor, ctx).await?;
        }
        (entry.handler)(ctx.clone(), request).await
    }
}
