//! Shortcut management methods.
//!
//! Methods (service `golinks.api.v1.ShortcutService`):
//! - `ListShortcuts`   — GET /shortcuts
//! - `GetShortcut`     — GET /shortcuts/{name}
//! - `CreateShortcut`  — POST /shortcuts
//! - `DeleteShortcut`  — DELETE /shortcuts/{name}

use axum::http::Method;
use serde::{Deserialize, Serialize};

use golinks_core::models::shortcut::{Shortcut, Visibility};
use golinks_core::models::subscription::Subscription;
use golinks_core::AppState;

use crate::gateway::{BodyMapping, PatternRegistryBuilder};
use crate::rpc::{unary, AccessPolicy, CallContext, MethodDescriptor, RpcCore, RpcStatus};

pub const SERVICE: &str = "golinks.api.v1.ShortcutService";

fn method(name: &str) -> String {
    format!("{}/{}", SERVICE, name)
}

pub fn register(core: &mut RpcCore, state: AppState) -> Result<(), String> {
    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("ListShortcuts"), AccessPolicy::Authenticated),
        unary(move |ctx, params: ListShortcutsParams| {
            let state = st.clone();
            async move { list(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("GetShortcut"), AccessPolicy::Authenticated),
        unary(move |ctx, params: GetShortcutParams| {
            let state = st.clone();
            async move { get(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("CreateShortcut"), AccessPolicy::Authenticated),
        unary(move |ctx, params: CreateShortcutParams| {
            let state = st.clone();
            async move { create(&state, &ctx, params).await }
        }),
    )?;

    let st = state;
    core.register(
        MethodDescriptor::new(method("DeleteShortcut"), AccessPolicy::Authenticated),
        unary(move |ctx, params: DeleteShortcutParams| {
            let state = st.clone();
            async move { delete(&state, &ctx, params).await }
        }),
    )?;

    Ok(())
}

pub fn routes(routes: &mut PatternRegistryBuilder) -> Result<(), String> {
    routes.add(
        Method::GET,
        "/shortcuts",
        &method("ListShortcuts"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::POST,
        "/shortcuts",
        &method("CreateShortcut"),
        BodyMapping::Whole,
    )?;
    routes.add(
        Method::GET,
        "/shortcuts/{name}",
        &method("GetShortcut"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::DELETE,
        "/shortcuts/{name}",
        &method("DeleteShortcut"),
        BodyMapping::None,
    )?;
    Ok(())
}

fn can_see(shortcut: &Shortcut, caller_id: i64, is_admin: bool) -> bool {
    is_admin || shortcut.creator_id == caller_id || shortcut.visibility != Visibility::Private
}

// ---------------------------------------------------------------------------
// ListShortcuts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListShortcutsParams {}

#[derive(Debug, Serialize)]
pub struct ListShortcutsResult {
    pub shortcuts: Vec<Shortcut>,
}

pub async fn list(
    state: &AppState,
    ctx: &CallContext,
    _params: ListShortcutsParams,
) -> Result<ListShortcutsResult, RpcStatus> {
    let caller_id = ctx.require_user_id()?;
    let is_admin = ctx.identity().is_admin();

    let shortcuts = state
        .shortcuts
        .list()
        .await?
        .into_iter()
        .filter(|s| can_see(s, caller_id, is_admin))
        .collect();

    Ok(ListShortcutsResult { shortcuts })
}

// ---------------------------------------------------------------------------
// GetShortcut
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetShortcutParams {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GetShortcutResult {
    pub shortcut: Shortcut,
}

pub async fn get(
    state: &AppState,
    ctx: &CallContext,
    params: GetShortcutParams,
) -> Result<GetShortcutResult, RpcStatus> {
    let caller_id = ctx.require_user_id()?;
    let is_admin = ctx.identity().is_admin();

    let shortcut = state.shortcuts.get_by_name(&params.name).await?;
    // Invisible shortcuts read as absent so names don't leak.
    match shortcut {
        Some(s) if can_see(&s, caller_id, is_admin) => Ok(GetShortcutResult { shortcut: s }),
        _ => Err(RpcStatus::not_found(format!(
            "Shortcut {} not found",
            params.name
        ))),
    }
}

// ---------------------------------------------------------------------------
// CreateShortcut
// ---------------------------------------------------------------------------

/// Creation payload as sent by clients; server-side fields (id, creator,
/// timestamps) are assigned here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortcutParams {
    pub shortcut: ShortcutInput,
}

#[derive(Debug, Serialize)]
pub struct CreateShortcutResult {
    pub shortcut: Shortcut,
}

pub async fn create(
    state: &AppState,
    ctx: &CallContext,
    params: CreateShortcutParams,
) -> Result<CreateShortcutResult, RpcStatus> {
    let caller_id = ctx.require_user_id()?;
    let input = params.shortcut;

    if input.name.is_empty() {
        return Err(RpcStatus::invalid_argument("Shortcut name is required"));
    }
    if !input
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RpcStatus::invalid_argument(
            "Shortcut name may contain only letters, digits, '-' and '_'",
        ));
    }
    if input.link.is_empty() {
        return Err(RpcStatus::invalid_argument("Shortcut link is required"));
    }

    let setting = state.settings.get().await?;
    let subscription = Subscription::from_license_key(&setting.license_key);
    if let Some(limit) = subscription.shortcut_limit {
        if state.shortcuts.count().await? >= limit {
            return Err(RpcStatus::permission_denied(
                "Shortcut limit reached for the current plan",
            ));
        }
    }

    let mut shortcut = Shortcut::new(caller_id, input.name, input.link);
    shortcut.title = input.title;
    shortcut.description = input.description;
    shortcut.visibility = input.visibility.unwrap_or(setting.default_visibility);

    state.shortcuts.create(&shortcut).await?;
    Ok(CreateShortcutResult { shortcut })
}

// ---------------------------------------------------------------------------
// DeleteShortcut
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShortcutParams {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteShortcutResult {
    pub deleted: bool,
}

pub async fn delete(
    state: &AppState,
    ctx: &CallContext,
    params: DeleteShortcutParams,
) -> Result<DeleteShortcutResult, RpcStatus> {
    let caller_id = ctx.require_user_id()?;
    let is_admin = ctx.identity().is_admin();

    let shortcut = state
        .shortcuts
        .get_by_name(&params.name)
        .await?
        .filter(|s| can_see(s, caller_id, is_admin))
        .ok_or_else(|| RpcStatus::not_found(format!("Shortcut {} not found", params.name)))?;

    if shortcut.creator_id != caller_id && !is_admin {
        return Err(RpcStatus::permission_denied(
            "Only the creator or an admin can delete a shortcut",
        ));
    }

    state.shortcuts.delete(&shortcut.id).await?;
    Ok(DeleteShortcutResult { deleted: true })
}
