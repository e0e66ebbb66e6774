//! Native protocol integration: calls over a real TCP connection, response
//! metadata, cancellation on dropped call futures, and connection reuse
//! after a cancel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use golinks_server::native::{start_native_server, NativeClient};
use golinks_server::rpc::{unary, AccessPolicy, MethodDescriptor, RpcCode, RpcCore};

#[derive(Deserialize)]
struct EchoParams {
    value: String,
}

#[derive(Serialize)]
struct EchoResult {
    value: String,
}

#[derive(Deserialize)]
struct EmptyParams {}

fn echo_descriptor() -> MethodDescriptor {
    MethodDescriptor::new("golinks.api.v1.TestService/Echo", AccessPolicy::Public)
}

fn register_echo(core: &mut RpcCore) {
    core.register(
        echo_descriptor(),
        unary(|_ctx, p: EchoParams| async move { Ok(EchoResult { value: p.value }) }),
    )
    .unwrap();
}

async fn start(core: RpcCore) -> SocketAddr {
    start_native_server("127.0.0.1:0", Arc::new(core))
        .await
        .expect("Failed to start native listener")
}

#[tokio::test]
async fn calls_round_trip_over_the_wire() {
    let mut core = RpcCore::new();
    register_echo(&mut core);
    let addr = start(core).await;

    let client = NativeClient::connect(addr).await.unwrap();
    let outcome = client
        .call(
            "golinks.api.v1.TestService/Echo",
            HashMap::new(),
            serde_json::json!({"value": "ping"}),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payload, serde_json::json!({"value": "ping"}));
}

#[tokio::test]
async fn concurrent_calls_multiplex_on_one_connection() {
    let mut core = RpcCore::new();
    register_echo(&mut core);
    let addr = start(core).await;

    let client = NativeClient::connect(addr).await.unwrap();
    let mut handles = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let outcome = client
                .call(
                    "golinks.api.v1.TestService/Echo",
                    HashMap::new(),
                    serde_json::json!({"value": format!("msg-{}", i)}),
                )
                .await
                .unwrap();
            assert_eq!(outcome.payload["value"], format!("msg-{}", i));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn unknown_method_fails_with_not_found() {
    let addr = start(RpcCore::new()).await;
    let client = NativeClient::connect(addr).await.unwrap();

    let err = client
        .call(
            "golinks.api.v1.TestService/Nope",
            HashMap::new(),
            serde_json::Value::Null,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcCode::NotFound);
    assert!(err.message.contains("is not registered"));
}

#[tokio::test]
async fn response_metadata_and_trailers_ride_back() {
    let mut core = RpcCore::new();
    core.register(
        MethodDescriptor::new("golinks.api.v1.TestService/Tagged", AccessPolicy::Public),
        unary(|ctx, _p: EmptyParams| async move {
            ctx.add_response_metadata("x-request-tag", "alpha");
            ctx.add_trailer("server-timing", "db;dur=1");
            Ok(EchoResult {
                value: "done".to_string(),
            })
        }),
    )
    .unwrap();
    let addr = start(core).await;

    let client = NativeClient::connect(addr).await.unwrap();
    let outcome = client
        .call(
            "golinks.api.v1.TestService/Tagged",
            HashMap::new(),
            serde_json::json!({}),
        )
        .await
        .unwrap();

    assert!(outcome
        .metadata
        .contains(&("x-request-tag".to_string(), "alpha".to_string())));
    assert!(outcome
        .trailers
        .contains(&("server-timing".to_string(), "db;dur=1".to_string())));
}

#[tokio::test]
async fn dropped_call_cancels_server_work() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    let mut core = RpcCore::new();
    core.register(
        MethodDescriptor::new("golinks.api.v1.TestService/Slow", AccessPolicy::Public),
        unary(move |_ctx, _p: EmptyParams| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(EchoResult {
                    value: "late".to_string(),
                })
            }
        }),
    )
    .unwrap();
    register_echo(&mut core);
    let addr = start(core).await;

    let client = NativeClient::connect(addr).await.unwrap();

    // Drop the call future before the handler finishes; the client sends a
    // cancel frame for the pending id.
    let call = client.call(
        "golinks.api.v1.TestService/Slow",
        HashMap::new(),
        serde_json::json!({}),
    );
    assert!(timeout(Duration::from_millis(50), call).await.is_err());

    // Wait past the handler's sleep; a cancelled handler never sets the flag.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(
        !finished.load(Ordering::SeqCst),
        "handler kept running after cancel"
    );

    // The connection still serves new calls afterwards.
    let outcome = client
        .call(
            "golinks.api.v1.TestService/Echo",
            HashMap::new(),
            serde_json::json!({"value": "after"}),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payload["value"], "after");
}
