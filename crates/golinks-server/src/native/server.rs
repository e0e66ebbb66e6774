//! Native RPC listener: accepts TCP connections, demultiplexes request
//! frames into per-call tasks against the shared [`RpcCore`], and writes
//! response frames back. A `cancel` frame (or the connection closing)
//! cancels the matching in-flight call through its context token.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::rpc::{CallContext, RpcCore};

use super::frame::{read_envelope, write_envelope, Envelope, WireStatus};

type CallMap = Arc<Mutex<HashMap<u64, CancellationToken>>>;
type SharedWriter = Arc<tokio::sync::Mutex<OwnedWriteHalf>>;

/// Bind the native listener and serve connections in the background.
/// Returns the bound address (useful with port 0 in tests).
pub async fn start_native_server(addr: &str, core: Arc<RpcCore>) -> Result<SocketAddr, String> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind native listener on {}: {}", addr, e))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get native listener address: {}", e))?;

    tracing::info!("Native RPC listener on {}", local_addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "Native connection accepted");
                    let core = core.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, core).await;
                        tracing::debug!(%peer, "Native connection closed");
                    });
                }
                Err(e) => {
                    tracing::warn!("Native accept failed: {}", e);
                }
            }
        }
    });

    Ok(local_addr)
}

async fn handle_connection(stream: TcpStream, core: Arc<RpcCore>) {
    let (mut reader, writer) = stream.into_split();
    let writer: SharedWriter = Arc::new(tokio::sync::Mutex::new(writer));
    let calls: CallMap = Arc::new(Mutex::new(HashMap::new()));
    let conn_token = CancellationToken::new();

    loop {
        let envelope = match read_envelope(&mut reader).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Native read failed: {}", e);
                break;
            }
        };

        match envelope {
            Envelope::Request {
                id,
                method,
                metadata,
                payload,
            } => {
                let call_token = conn_token.child_token();
                if let Ok(mut map) = calls.lock() {
                    map.insert(id, call_token.clone());
                }

                let core = core.clone();
                let writer = writer.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    let mut ctx = CallContext::new(metadata, call_token.clone());

                    let result = tokio::select! {
                        _ = call_token.cancelled() => {
                            // Cancelled calls produce no response frame at all.
                            return;
                        }
                        result = core.invoke(&method, payload, &mut ctx) => result,
                    };

                    if let Ok(mut map) = calls.lock() {
                        map.remove(&id);
                    }
                    // A cancel racing call completion still suppresses the response.
                    if ctx.is_cancelled() {
                        return;
                    }

                    let response = match result {
                        Ok(payload) => Envelope::Response {
                            id,
                            status: WireStatus::ok(),
                            metadata: ctx.response_metadata(),
                            trailers: ctx.trailers(),
                            payload,
                        },
                        Err(status) => Envelope::Response {
                            id,
                            status: WireStatus::from(&status),
                            metadata: ctx.response_metadata(),
                            trailers: ctx.trailers(),
                            payload: serde_json::Value::Null,
                        },
                    };

                    let mut w = writer.lock().await;
                    if let Err(e) = write_envelope(&mut *w, &response).await {
                        tracing::warn!(id, "Failed to write native response: {}", e);
                    }
                });
            }
            Envelope::Cancel { id } => {
                let token = calls.lock().ok().and_then(|mut map| map.remove(&id));
                if let Some(token) = token {
                    tracing::debug!(id, "Call cancelled by peer");
                    token.cancel();
                }
            }
            Envelope::Response { id, .. } => {
                tracing::warn!(id, "Unexpected response frame from client, ignoring");
            }
        }
    }

    // Connection gone: cancel everything still in flight.
    conn_token.cancel();
}
