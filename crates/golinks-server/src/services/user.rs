//! User and access-token methods.
//!
//! Methods (service `golinks.api.v1.UserService`):
//! - `GetUser`           — GET /users/{id}
//! - `ListUsers`         — GET /users (admin)
//! - `CreateUser`        — POST /users (admin)
//! - `CreateAccessToken` — POST /users/{id}/access-tokens
//! - `ListAccessTokens`  — GET /users/{id}/access-tokens
//! - `DeleteAccessToken` — DELETE /users/{id}/access-tokens/{tokenId}
//!
//! Token operations are self-or-admin: a caller may manage their own
//! tokens, an admin anyone's.

use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use golinks_core::models::subscription::Subscription;
use golinks_core::models::user::{Role, User};
use golinks_core::store::AccessToken;
use golinks_core::AppState;

use crate::gateway::{BodyMapping, PatternRegistryBuilder};
use crate::rpc::{
    unary, AccessPolicy, CallContext, MethodDescriptor, RpcCore, RpcStatus, ACCESS_TOKEN_COOKIE,
};

pub const SERVICE: &str = "golinks.api.v1.UserService";

fn method(name: &str) -> String {
    format!("{}/{}", SERVICE, name)
}

pub fn register(core: &mut RpcCore, state: AppState) -> Result<(), String> {
    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("GetUser"), AccessPolicy::Authenticated),
        unary(move |ctx, params: GetUserParams| {
            let state = st.clone();
            async move { get(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("ListUsers"), AccessPolicy::AdminOnly),
        unary(move |ctx, params: ListUsersParams| {
            let state = st.clone();
            async move { list(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("CreateUser"), AccessPolicy::AdminOnly),
        unary(move |ctx, params: CreateUserParams| {
            let state = st.clone();
            async move { create(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("CreateAccessToken"), AccessPolicy::Authenticated),
        unary(move |ctx, params: CreateAccessTokenParams| {
            let state = st.clone();
            async move { create_access_token(&state, &ctx, params).await }
        }),
    )?;

    let st = state.clone();
    core.register(
        MethodDescriptor::new(method("ListAccessTokens"), AccessPolicy::Authenticated),
        unary(move |ctx, params: ListAccessTokensParams| {
            let state = st.clone();
            async move { list_access_tokens(&state, &ctx, params).await }
        }),
    )?;

    let st = state;
    core.register(
        MethodDescriptor::new(method("DeleteAccessToken"), AccessPolicy::Authenticated),
        unary(move |ctx, params: DeleteAccessTokenParams| {
            let state = st.clone();
            async move { delete_access_token(&state, &ctx, params).await }
        }),
    )?;

    Ok(())
}

pub fn routes(routes: &mut PatternRegistryBuilder) -> Result<(), String> {
    routes.add(Method::GET, "/users", &method("ListUsers"), BodyMapping::None)?;
    routes.add(Method::POST, "/users", &method("CreateUser"), BodyMapping::Whole)?;
    routes.add(
        Method::GET,
        "/users/{id:int}",
        &method("GetUser"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::POST,
        "/users/{id:int}/access-tokens",
        &method("CreateAccessToken"),
        BodyMapping::Whole,
    )?;
    routes.add(
        Method::GET,
        "/users/{id:int}/access-tokens",
        &method("ListAccessTokens"),
        BodyMapping::None,
    )?;
    routes.add(
        Method::DELETE,
        "/users/{id:int}/access-tokens/{tokenId}",
        &method("DeleteAccessToken"),
        BodyMapping::None,
    )?;
    Ok(())
}

/// Token management is allowed for the token owner and for admins.
fn check_self_or_admin(ctx: &CallContext, target_user_id: i64) -> Result<(), RpcStatus> {
    let caller_id = ctx.require_user_id()?;
    if caller_id == target_user_id || ctx.identity().is_admin() {
        Ok(())
    } else {
        Err(RpcStatus::permission_denied(
            "Cannot manage another user's access tokens",
        ))
    }
}

// ---------------------------------------------------------------------------
// GetUser
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserParams {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct GetUserResult {
    pub user: User,
}

pub async fn get(
    state: &AppState,
    _ctx: &CallContext,
    params: GetUserParams,
) -> Result<GetUserResult, RpcStatus> {
    let user = state
        .users
        .get(params.id)
        .await?
        .ok_or_else(|| RpcStatus::not_found(format!("User {} not found", params.id)))?;
    Ok(GetUserResult { user })
}

// ---------------------------------------------------------------------------
// ListUsers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {}

#[derive(Debug, Serialize)]
pub struct ListUsersResult {
    pub users: Vec<User>,
}

pub async fn list(
    state: &AppState,
    _ctx: &CallContext,
    _params: ListUsersParams,
) -> Result<ListUsersResult, RpcStatus> {
    let users = state.users.list().await?;
    Ok(ListUsersResult { users })
}

// ---------------------------------------------------------------------------
// CreateUser
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserParams {
    pub user: UserInput,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResult {
    pub user: User,
}

pub async fn create(
    state: &AppState,
    _ctx: &CallContext,
    params: CreateUserParams,
) -> Result<CreateUserResult, RpcStatus> {
    let input = params.user;
    if input.username.is_empty() {
        return Err(RpcStatus::invalid_argument("Username is required"));
    }

    let setting = state.settings.get().await?;
    let subscription = Subscription::from_license_key(&setting.license_key);
    if let Some(limit) = subscription.user_limit {
        if state.users.count().await? >= limit {
            return Err(RpcStatus::permission_denied(
                "User limit reached for the current plan",
            ));
        }
    }

    let nickname = if input.nickname.is_empty() {
        input.username.clone()
    } else {
        input.nickname
    };
    let user = state
        .users
        .create(&input.username, &nickname, input.role.unwrap_or(Role::User))
        .await?;
    Ok(CreateUserResult { user })
}

// ---------------------------------------------------------------------------
// CreateAccessToken
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessTokenParams {
    pub id: i64,
    #[serde(default)]
    pub description: String,
    /// Absent means the token never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessTokenResult {
    /// The raw secret. Shown exactly once; only its hash is stored.
    pub access_token: String,
    pub token: AccessToken,
}

pub async fn create_access_token(
    state: &AppState,
    ctx: &CallContext,
    params: CreateAccessTokenParams,
) -> Result<CreateAccessTokenResult, RpcStatus> {
    check_self_or_admin(ctx, params.id)?;

    state
        .users
        .get(params.id)
        .await?
        .ok_or_else(|| RpcStatus::not_found(format!("User {} not found", params.id)))?;

    let (raw, token) = state
        .auth
        .mint(params.id, &params.description, params.expires_at)
        .await?;

    // Let browser clients pick the credential up without reading the body.
    ctx.add_response_metadata(
        "set-cookie",
        format!("{}={}; Path=/; HttpOnly; SameSite=Strict", ACCESS_TOKEN_COOKIE, raw),
    );

    Ok(CreateAccessTokenResult {
        access_token: raw,
        token,
    })
}

// ---------------------------------------------------------------------------
// ListAccessTokens
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccessTokensParams {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ListAccessTokensResult {
    pub tokens: Vec<AccessToken>,
}

pub async fn list_access_tokens(
    state: &AppState,
    ctx: &CallContext,
    params: ListAccessTokensParams,
) -> Result<ListAccessTokensResult, RpcStatus> {
    check_self_or_admin(ctx, params.id)?;
    let tokens = state.tokens.list_for_user(params.id).await?;
    Ok(ListAccessTokensResult { tokens })
}

// ---------------------------------------------------------------------------
// DeleteAccessToken
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccessTokenParams {
    pub id: i64,
    pub token_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccessTokenResult {
    pub deleted: bool,
}

pub async fn delete_access_token(
    state: &AppState,
    ctx: &CallContext,
    params: DeleteAccessTokenParams,
) -> Result<DeleteAccessTokenResult, RpcStatus> {
    check_self_or_admin(ctx, params.id)?;

    let owned = state
        .tokens
        .list_for_user(params.id)
        .await?
        .into_iter()
        .any(|t| t.id == params.token_id);
    if !owned {
        return Err(RpcStatus::not_found(format!(
            "Access token {} not found",
            params.token_id
        )));
    }

    state.tokens.delete(&params.token_id).await?;
    Ok(DeleteAccessTokenResult { deleted: true })
}
