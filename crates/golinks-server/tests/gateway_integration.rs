//! Integration tests for the gateway: both listeners are started and the
//! three wire surfaces (REST, native, browser framing) are driven against
//! the same in-memory state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use golinks_core::models::user::Role;
use golinks_core::state::{AppState, AppStateInner};
use golinks_core::Database;

use golinks_server::native::NativeClient;
use golinks_server::rpc::RpcCode;
use golinks_server::{start_server_with_state, ServerConfig, DEFAULT_HOST_USERNAME};

struct Gateway {
    http: String,
    rpc_addr: std::net::SocketAddr,
    state: AppState,
    client: reqwest::Client,
}

/// Start both listeners on free ports over a fresh in-memory database.
async fn start_gateway() -> Gateway {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let state: AppState = Arc::new(AppStateInner::new(db));
    state
        .ensure_host_user(DEFAULT_HOST_USERNAME)
        .await
        .expect("Failed to bootstrap host user");

    let config = ServerConfig {
        http_port: 0,
        rpc_port: 0,
        ..Default::default()
    };
    let handles = start_server_with_state(config, state.clone())
        .await
        .expect("Failed to start server");

    // Give the listeners a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    Gateway {
        http: format!("http://{}", handles.http_addr),
        rpc_addr: handles.rpc_addr,
        state,
        client: reqwest::Client::new(),
    }
}

async fn admin_token(gw: &Gateway) -> String {
    let admin = gw.state.users.find_host().await.unwrap().unwrap();
    let (raw, _) = gw.state.auth.mint(admin.id, "test", None).await.unwrap();
    raw
}

/// Create a regular member and mint them a token.
async fn member(gw: &Gateway, username: &str) -> (i64, String) {
    let user = gw
        .state
        .users
        .create(username, username, Role::User)
        .await
        .unwrap();
    let (raw, _) = gw.state.auth.mint(user.id, "test", None).await.unwrap();
    (user.id, raw)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

// Browser-framing helpers: 1-byte flag (0x00 data, 0x80 trailers) plus a
// 4-byte big-endian length per frame.

fn frame(flag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![flag];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn parse_frames(body: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut frames = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let flag = body[i];
        let len =
            u32::from_be_bytes([body[i + 1], body[i + 2], body[i + 3], body[i + 4]]) as usize;
        i += 5;
        frames.push((flag, body[i..i + len].to_vec()));
        i += len;
    }
    frames
}

fn trailer_value(frames: &[(u8, Vec<u8>)], key: &str) -> Option<String> {
    let trailers = frames.iter().find(|(flag, _)| flag & 0x80 != 0)?;
    let text = String::from_utf8(trailers.1.clone()).ok()?;
    for line in text.split("\r\n") {
        if let Some((k, v)) = line.split_once(": ") {
            if k == key {
                return Some(v.to_string());
            }
        }
    }
    None
}

/// POST one call over the browser-framing surface and return its frames.
async fn web_call(
    gw: &Gateway,
    method: &str,
    token: Option<&str>,
    payload: serde_json::Value,
) -> (reqwest::StatusCode, Vec<(u8, Vec<u8>)>) {
    let body = frame(0x00, payload.to_string().as_bytes());
    let mut req = gw
        .client
        .post(format!("{}/{}", gw.http, method))
        .header("content-type", "application/grpc-web+json")
        .body(body);
    if let Some(token) = token {
        req = req.header("authorization", bearer(token));
    }
    let resp = req.send().await.unwrap();
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap();
    (status, parse_frames(&bytes))
}

#[tokio::test]
async fn health_and_workspace_profile_are_public() {
    let gw = start_gateway().await;

    let resp = gw
        .client
        .get(format!("{}/api/health", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // The profile route is public by design, no credential attached.
    let resp = gw
        .client
        .get(format!("{}/api/v1/workspace/profile", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["profile"]["hasHost"], true);
    assert!(body["profile"]["version"].as_str().is_some());
}

#[tokio::test]
async fn rest_rejects_missing_and_invalid_credentials() {
    let gw = start_gateway().await;

    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "unauthenticated");

    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer("glk_not_a_real_token"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn typed_path_variable_failure_is_local() {
    let gw = start_gateway().await;

    // Translation happens before dispatch, so the conversion failure wins
    // over the missing credential.
    let resp = gw
        .client
        .get(format!("{}/api/v1/users/abc", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_argument");
    assert!(
        body["message"].as_str().unwrap().contains("parameter: id"),
        "{}",
        body["message"]
    );
}

#[tokio::test]
async fn missing_credential_rejected_on_every_surface() {
    let gw = start_gateway().await;

    // REST: 401 with the structured error body.
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Native: unauthenticated status on the call itself.
    let native = NativeClient::connect(gw.rpc_addr).await.unwrap();
    let err = native
        .call(
            "golinks.api.v1.ShortcutService/ListShortcuts",
            HashMap::new(),
            serde_json::json!({}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcCode::Unauthenticated);

    // Browser framing: HTTP 200 with the status in the trailers frame.
    let (status, frames) = web_call(
        &gw,
        "golinks.api.v1.ShortcutService/ListShortcuts",
        None,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(trailer_value(&frames, "rpc-status").as_deref(), Some("16"));
    assert!(trailer_value(&frames, "rpc-message").is_some());
}

#[tokio::test]
async fn shortcut_lifecycle_over_rest() {
    let gw = start_gateway().await;
    let token = admin_token(&gw).await;

    // Create
    let resp = gw
        .client
        .post(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&token))
        .json(&serde_json::json!({
            "shortcut": {"name": "docs", "link": "https://docs.example.com"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["shortcut"]["name"], "docs");
    assert_eq!(body["shortcut"]["visibility"], "private");

    // Duplicate name conflicts
    let resp = gw
        .client
        .post(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&token))
        .json(&serde_json::json!({
            "shortcut": {"name": "docs", "link": "https://elsewhere.example.com"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "already_exists");

    // List contains it
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["shortcuts"].as_array().unwrap().len(), 1);

    // Get by name
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts/docs", gw.http))
        .header("authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Delete, then the name is gone
    let resp = gw
        .client
        .delete(format!("{}/api/v1/shortcuts/docs", gw.http))
        .header("authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts/docs", gw.http))
        .header("authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn identical_payload_across_all_three_surfaces() {
    let gw = start_gateway().await;
    let token = admin_token(&gw).await;

    // ── Seed: create one shortcut over REST ─────────────────────────
    let resp = gw
        .client
        .post(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&token))
        .json(&serde_json::json!({
            "shortcut": {"name": "wiki", "link": "https://wiki.example.com", "title": "Wiki"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // ── Surface 1: REST ─────────────────────────────────────────────
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts/wiki", gw.http))
        .header("authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let rest_body: serde_json::Value = resp.json().await.unwrap();

    // ── Surface 2: native ───────────────────────────────────────────
    let native = NativeClient::connect(gw.rpc_addr).await.unwrap();
    let mut metadata = HashMap::new();
    metadata.insert("authorization".to_string(), bearer(&token));
    let outcome = native
        .call(
            "golinks.api.v1.ShortcutService/GetShortcut",
            metadata,
            serde_json::json!({"name": "wiki"}),
        )
        .await
        .unwrap();

    // ── Surface 3: browser framing ──────────────────────────────────
    let (status, frames) = web_call(
        &gw,
        "golinks.api.v1.ShortcutService/GetShortcut",
        Some(&token),
        serde_json::json!({"name": "wiki"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(trailer_value(&frames, "rpc-status").as_deref(), Some("0"));
    let data: Vec<u8> = frames
        .iter()
        .filter(|(flag, _)| flag & 0x80 == 0)
        .flat_map(|(_, payload)| payload.clone())
        .collect();
    let web_body: serde_json::Value = serde_json::from_slice(&data).unwrap();

    // One method, one payload, three encodings.
    assert_eq!(rest_body, outcome.payload);
    assert_eq!(rest_body, web_body);
    assert_eq!(rest_body["shortcut"]["title"], "Wiki");
}

#[tokio::test]
async fn cookie_carries_the_credential() {
    let gw = start_gateway().await;
    let token = admin_token(&gw).await;

    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .header("cookie", format!("golinks.access-token={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn admin_only_is_enforced_for_members() {
    let gw = start_gateway().await;
    let admin = admin_token(&gw).await;
    let (_, member_token) = member(&gw, "bob").await;

    let resp = gw
        .client
        .get(format!("{}/api/v1/users", gw.http))
        .header("authorization", bearer(&member_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "permission_denied");

    let resp = gw
        .client
        .get(format!("{}/api/v1/users", gw.http))
        .header("authorization", bearer(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_access_token_returns_secret_once_and_sets_cookie() {
    let gw = start_gateway().await;
    let (user_id, token) = member(&gw, "carol").await;

    let resp = gw
        .client
        .post(format!("{}/api/v1/users/{}/access-tokens", gw.http, user_id))
        .header("authorization", bearer(&token))
        .json(&serde_json::json!({"description": "ci"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("golinks.access-token=glk_"), "{}", cookie);

    let body: serde_json::Value = resp.json().await.unwrap();
    let raw = body["accessToken"].as_str().unwrap();
    assert!(raw.starts_with("glk_"));
    assert_eq!(body["token"]["description"], "ci");
    // Only the hash is stored; the record never echoes the secret.
    assert!(body["token"].get("tokenHash").is_none());

    // The fresh token authenticates.
    let resp = gw
        .client
        .get(format!("{}/api/v1/users/{}/access-tokens", gw.http, user_id))
        .header("authorization", bearer(raw))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["tokens"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn members_cannot_touch_other_users_tokens() {
    let gw = start_gateway().await;
    let (alice_id, _) = member(&gw, "alice").await;
    let (_, bob_token) = member(&gw, "bob").await;

    let resp = gw
        .client
        .get(format!("{}/api/v1/users/{}/access-tokens", gw.http, alice_id))
        .header("authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // An admin can.
    let admin = admin_token(&gw).await;
    let resp = gw
        .client
        .get(format!("{}/api/v1/users/{}/access-tokens", gw.http, alice_id))
        .header("authorization", bearer(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn subscription_follows_the_license_key() {
    let gw = start_gateway().await;
    let admin = admin_token(&gw).await;

    // Public read, free by default.
    let resp = gw
        .client
        .get(format!("{}/api/v1/subscription", gw.http))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["subscription"]["plan"], "free");
    assert_eq!(body["subscription"]["shortcutLimit"], 100);

    // Garbage keys are rejected without being stored.
    let resp = gw
        .client
        .patch(format!("{}/api/v1/subscription", gw.http))
        .header("authorization", bearer(&admin))
        .json(&serde_json::json!({"licenseKey": "bogus"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // A pro key upgrades the plan.
    let resp = gw
        .client
        .patch(format!("{}/api/v1/subscription", gw.http))
        .header("authorization", bearer(&admin))
        .json(&serde_json::json!({"licenseKey": "pro-0123456789abcdef"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["subscription"]["plan"], "pro");
    assert!(body["subscription"]["shortcutLimit"].is_null());

    let resp = gw
        .client
        .get(format!("{}/api/v1/subscription", gw.http))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["subscription"]["plan"], "pro");
}

#[tokio::test]
async fn workspace_setting_patch_maps_body_into_field() {
    let gw = start_gateway().await;
    let admin = admin_token(&gw).await;

    // The PATCH body is the setting itself; the translator nests it under
    // the `setting` request field.
    let resp = gw
        .client
        .patch(format!("{}/api/v1/workspace/setting", gw.http))
        .header("authorization", bearer(&admin))
        .json(&serde_json::json!({"defaultVisibility": "workspace", "customStyle": "body {}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = gw
        .client
        .get(format!("{}/api/v1/workspace/setting", gw.http))
        .header("authorization", bearer(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["setting"]["defaultVisibility"], "workspace");
    assert_eq!(body["setting"]["customStyle"], "body {}");

    // New shortcuts now default to the configured visibility.
    let resp = gw
        .client
        .post(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&admin))
        .json(&serde_json::json!({
            "shortcut": {"name": "team", "link": "https://team.example.com"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["shortcut"]["visibility"], "workspace");
}

#[tokio::test]
async fn private_shortcuts_are_hidden_from_other_members() {
    let gw = start_gateway().await;
    let (_, alice_token) = member(&gw, "alice").await;
    let (_, bob_token) = member(&gw, "bob").await;

    let resp = gw
        .client
        .post(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&alice_token))
        .json(&serde_json::json!({
            "shortcut": {"name": "secret", "link": "https://secret.example.com"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Bob cannot see it, by list or by name.
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts", gw.http))
        .header("authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["shortcuts"].as_array().unwrap().len(), 0);

    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts/secret", gw.http))
        .header("authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // The admin sees everything.
    let admin = admin_token(&gw).await;
    let resp = gw
        .client
        .get(format!("{}/api/v1/shortcuts/secret", gw.http))
        .header("authorization", bearer(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn reflection_lists_methods_over_native() {
    let gw = start_gateway().await;

    let native = NativeClient::connect(gw.rpc_addr).await.unwrap();
    let outcome = native
        .call(
            "golinks.api.v1.ReflectionService/ListMethods",
            HashMap::new(),
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let methods = outcome.payload["methods"].as_array().unwrap();
    let names: Vec<&str> = methods
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"golinks.api.v1.ShortcutService/CreateShortcut"));
    assert!(names.contains(&"golinks.api.v1.ReflectionService/ListMethods"));

    let list_users = methods
        .iter()
        .find(|m| m["name"] == "golinks.api.v1.UserService/ListUsers")
        .unwrap();
    assert_eq!(list_users["access"], "admin_only");
}
