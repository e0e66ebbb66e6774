//! `golinks call` — Invoke one method over the native protocol.

use std::collections::HashMap;

use golinks_server::native::NativeClient;

use super::print_json;

pub async fn run(
    addr: &str,
    method: &str,
    params_str: &str,
    token: Option<&str>,
) -> Result<(), String> {
    let params: serde_json::Value =
        serde_json::from_str(params_str).map_err(|e| format!("Invalid JSON params: {}", e))?;

    let mut metadata = HashMap::new();
    if let Some(token) = token {
        metadata.insert("authorization".to_string(), format!("Bearer {}", token));
    }

    let client = NativeClient::connect(addr)
        .await
        .map_err(|e| format!("Failed to connect to {}: {}", addr, e))?;

    let outcome = client
        .call(method, metadata, params)
        .await
        .map_err(|e| e.to_string())?;

    print_json(&outcome.payload);
    Ok(())
}
