//! Subscription methods.
//!
//! Methods (service `golinks.api.v1.SubscriptionService`):
//! - `GetSubscription`    — GET /subscription (public)
//! - `UpdateSubscription` — PATCH /subscription (admin)
//!
//! The subscription is derived from the stored license key, never stored
//! itself.

use axum::http::Method;
use serde::{Deserialize, Serialize};

use golinks_core::models::subscription::{Plan, Subscription};
use golinks_core::AppState;

use crate::gateway::{BodyMapping, PatternRegistryBuilder};
use crate::rpc::{unary, AccessPolicy, CallContext, MethodDescriptor, RpcCore, RpcStatus};

pub const SERVICE: &str = "golinks.api.v1.SubscriptionService";

fn method(name: &str) -> String {
    format!("{}/{}", SERVICE, name)
}

pub fn register(core: &mut RpcCore, state: AppState) -> Result<(), String> {
    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("GetSubscription"), AccessPolicy::Public),
        unary(move |ctx, params: GetSubscriptionParams| {
            let state = st.clone();
            async move { get(&state, &ctx, params).await }
        }),
    )?;

    let st = state;
    core.register(
        MethodDescriptor::new(method("UpdateSubscription"), AccessPolicy::AdminOnly),
        unary(move |ctx, params: UpdateSubscriptionParams| {
            let state = st.clone();
            async move { update(&state, &ctx, params).await }
        }),
    )?;

    Ok(())
}

pub fn routes(routes: &mut PatternRegistryBuilder) -> Result<(), String> {
    routes.add(
        Method::GET,
        "/subscription",
        &method("GetSubscription"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::PATCH,
        "/subscription",
        &method("UpdateSubscription"),
        BodyMapping::Whole,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// GetSubscription
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GetSubscriptionParams {}

#[derive(Debug, Serialize)]
pub struct GetSubscriptionResult {
    pub subscription: Subscription,
}

pub async fn get(
    state: &AppState,
    _ctx: &CallContext,
    _params: GetSubscriptionParams,
) -> Result<GetSubscriptionResult, RpcStatus> {
    let setting = state.settings.get().await?;
    Ok(GetSubscriptionResult {
        subscription: Subscription::from_license_key(&setting.license_key),
    })
}

// ---------------------------------------------------------------------------
// UpdateSubscription
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionParams {
    /// Empty clears the key and drops back to the free plan.
    #[serde(default)]
    pub license_key: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateSubscriptionResult {
    pub subscription: Subscription,
}

pub async fn update(
    state: &AppState,
    _ctx: &CallContext,
    params: UpdateSubscriptionParams,
) -> Result<UpdateSubscriptionResult, RpcStatus> {
    let key = params.license_key.trim();
    let subscription = Subscription::from_license_key(key);
    if !key.is_empty() && subscription.plan == Plan::Free {
        return Err(RpcStatus::invalid_argument("Invalid license key"));
    }

    let mut setting = state.settings.get().await?;
    setting.license_key = key.to_string();
    state.settings.set(&setting).await?;

    Ok(UpdateSubscriptionResult { subscription })
}
