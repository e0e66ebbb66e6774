//! Method introspection.
//!
//! Methods (service `golinks.api.v1.ReflectionService`):
//! - `ListMethods` — native/web only, no REST route (public)
//!
//! Must be registered after every other service so the captured catalogue
//! covers the whole registry, including this method itself.

use serde::{Deserialize, Serialize};

use crate::rpc::{unary, AccessPolicy, CallContext, MethodDescriptor, MethodInfo, RpcCore, RpcStatus};

pub const SERVICE: &str = "golinks.api.v1.ReflectionService";

fn method(name: &str) -> String {
    format!("{}/{}", SERVICE, name)
}

pub fn register(core: &mut RpcCore) -> Result<(), String> {
    let name = method("ListMethods");

    let mut catalog = core.catalog();
    catalog.push(MethodInfo {
        name: name.clone(),
        access: AccessPolicy::Public,
    });
    catalog.sort_by(|a, b| a.name.cmp(&b.name));

    core.register(
        MethodDescriptor::new(name, AccessPolicy::Public),
        unary(move |ctx, params: ListMethodsParams| {
            let catalog = catalog.clone();
            async move { list(catalog, &ctx, params).await }
        }),
    )
}

// ---------------------------------------------------------------------------
// ListMethods
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListMethodsParams {}

#[derive(Debug, Serialize)]
pub struct ListMethodsResult {
    pub methods: Vec<MethodInfo>,
}

pub async fn list(
    catalog: Vec<MethodInfo>,
    _ctx: &CallContext,
    _params: ListMethodsParams,
) -> Result<ListMethodsResult, RpcStatus> {
    Ok(ListMethodsResult { methods: catalog })
}
