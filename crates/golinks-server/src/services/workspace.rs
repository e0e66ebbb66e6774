//! Workspace profile and settings methods.
//!
//! Methods (service `golinks.api.v1.WorkspaceService`):
//! - `GetWorkspaceProfile`    — GET /workspace/profile (public)
//! - `GetWorkspaceSetting`    — GET /workspace/setting (admin)
//! - `UpdateWorkspaceSetting` — PATCH /workspace/setting (admin)

use axum::http::Method;
use serde::{Deserialize, Serialize};

use golinks_core::models::workspace::{WorkspaceProfile, WorkspaceSetting};
use golinks_core::AppState;

use crate::gateway::{BodyMapping, PatternRegistryBuilder};
use crate::rpc::{unary, AccessPolicy, CallContext, MethodDescriptor, RpcCore, RpcStatus};

pub const SERVICE: &str = "golinks.api.v1.WorkspaceService";

fn method(name: &str) -> String {
    format!("{}/{}", SERVICE, name)
}

pub fn register(core: &mut RpcCore, state: AppState) -> Result<(), String> {
    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("GetWorkspaceProfile"), AccessPolicy::Public),
        unary(move |ctx, params: GetWorkspaceProfileParams| {
            let state = st.clone();
            async move { get_profile(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("GetWorkspaceSetting"), AccessPolicy::AdminOnly),
        unary(move |ctx, params: GetWorkspaceSettingParams| {
            let state = st.clone();
            async move { get_setting(&state, &ctx, params).await }
        }),
    )?;

    let st = state;
    core.register(
        MethodDescriptor::new(method("UpdateWorkspaceSetting"), AccessPolicy::AdminOnly),
        unary(move |ctx, params: UpdateWorkspaceSettingParams| {
            let state = st.clone();
            async move { update_setting(&state, &ctx, params).await }
        }),
    )?;

    Ok(())
}

pub fn routes(routes: &mut PatternRegistryBuilder) -> Result<(), String> {
    routes.add(
        Method::GET,
        "/workspace/profile",
        &method("GetWorkspaceProfile"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::GET,
        "/workspace/setting",
        &method("GetWorkspaceSetting"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::PATCH,
        "/workspace/setting",
        &method("UpdateWorkspaceSetting"),
        BodyMapping::Field("setting".to_string()),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// GetWorkspaceProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GetWorkspaceProfileParams {}

#[derive(Debug, Serialize)]
pub struct GetWorkspaceProfileResult {
    pub profile: WorkspaceProfile,
}

pub async fn get_profile(
    state: &AppState,
    _ctx: &CallContext,
    _params: GetWorkspaceProfileParams,
) -> Result<GetWorkspaceProfileResult, RpcStatus> {
    let has_host = state.users.find_host().await?.is_some();
    Ok(GetWorkspaceProfileResult {
        profile: WorkspaceProfile {
            version: state.version.clone(),
            has_host,
        },
    })
}

// ---------------------------------------------------------------------------
// GetWorkspaceSetting
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GetWorkspaceSettingParams {}

#[derive(Debug, Serialize)]
pub struct GetWorkspaceSettingResult {
    pub setting: WorkspaceSetting,
}

pub async fn get_setting(
    state: &AppState,
    _ctx: &CallContext,
    _params: GetWorkspaceSettingParams,
) -> Result<GetWorkspaceSettingResult, RpcStatus> {
    let setting = state.settings.get().await?;
    Ok(GetWorkspaceSettingResult { setting })
}

// ---------------------------------------------------------------------------
// UpdateWorkspaceSetting
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceSettingParams {
    pub setting: WorkspaceSetting,
}

#[derive(Debug, Serialize)]
pub struct UpdateWorkspaceSettingResult {
    pub setting: WorkspaceSetting,
}

pub async fn update_setting(
    state: &AppState,
    _ctx: &CallContext,
    params: UpdateWorkspaceSettingParams,
) -> Result<UpdateWorkspaceSettingResult, RpcStatus> {
    state.settings.set(&params.setting).await?;
    Ok(UpdateWorkspaceSettingResult {
        setting: params.setting,
    })
}
