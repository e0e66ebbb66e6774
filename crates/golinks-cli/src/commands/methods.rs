//! `golinks methods` — List the methods a running gateway exposes.

use std::collections::HashMap;

use golinks_server::native::NativeClient;

use super::print_json;

pub async fn run(addr: &str) -> Result<(), String> {
    let client = NativeClient::connect(addr)
        .await
        .map_err(|e| format!("Failed to connect to {}: {}", addr, e))?;

    let outcome = client
        .call(
            "golinks.api.v1.ReflectionService/ListMethods",
            HashMap::new(),
            serde_json::json!({}),
        )
        .await
        .map_err(|e| e.to_string())?;

    print_json(&outcome.payload);
    Ok(())
}
