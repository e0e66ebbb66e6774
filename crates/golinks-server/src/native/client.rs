//! Client side of the native protocol. One connection multiplexes any
//! number of concurrent calls; responses are routed back to their callers
//! by id. Dropping a pending call future sends a `cancel` frame so the
//! server stops work on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::oneshot;

use crate::rpc::status::RpcStatus;

use super::frame::{read_envelope, write_envelope, Envelope, WireStatus};

/// Everything a successful call carries besides the payload.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub payload: serde_json::Value,
    pub metadata: Vec<(String, String)>,
    pub trailers: Vec<(String, String)>,
}

struct Reply {
    status: WireStatus,
    metadata: Vec<(String, String)>,
    trailers: Vec<(String, String)>,
    payload: serde_json::Value,
}

struct ClientInner {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
    next_id: AtomicU64,
}

/// Handle to one native connection. Clones share the connection.
#[derive(Clone)]
pub struct NativeClient {
    inner: Arc<ClientInner>,
}

impl NativeClient {
    /// Dial the native listener and start the response reader task.
    pub async fn connect(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (mut reader, writer) = stream.into_split();

        let inner = Arc::new(ClientInner {
            writer: tokio::sync::Mutex::new(writer),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        });

        let read_side = inner.clone();
        tokio::spawn(async move {
            loop {
                match read_envelope(&mut reader).await {
                    Ok(Some(Envelope::Response {
                        id,
                        status,
                        metadata,
                        trailers,
                        payload,
                    })) => {
                        let sender = read_side
                            .pending
                            .lock()
                            .ok()
                            .and_then(|mut p| p.remove(&id));
                        if let Some(sender) = sender {
                            let _ = sender.send(Reply {
                                status,
                                metadata,
                                trailers,
                                payload,
                            });
                        }
                    }
                    Ok(Some(other)) => {
                        tracing::warn!("Unexpected frame from server: {:?}", other);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Native client read failed: {}", e);
                        break;
                    }
                }
            }
            // Connection gone: fail whatever is still pending by dropping
            // the senders, which wakes the waiting calls with an error.
            if let Ok(mut pending) = read_side.pending.lock() {
                pending.clear();
            }
        });

        Ok(Self { inner })
    }

    /// Invoke one method and wait for its response. If the returned future
    /// is dropped early, a `cancel` frame for this call id is sent.
    pub async fn call(
        &self,
        method: &str,
        metadata: HashMap<String, String>,
        payload: serde_json::Value,
    ) -> Result<CallOutcome, RpcStatus> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .map_err(|_| RpcStatus::internal("Native client state poisoned"))?
            .insert(id, tx);

        let mut guard = CancelOnDrop {
            inner: self.inner.clone(),
            id,
            armed: true,
        };

        let request = Envelope::Request {
            id,
            method: method.to_string(),
            metadata,
            payload,
        };
        {
            let mut writer = self.inner.writer.lock().await;
            write_envelope(&mut *writer, &request)
                .await
                .map_err(|e| RpcStatus::internal(format!("Native call write failed: {}", e)))?;
        }

        let reply = rx
            .await
            .map_err(|_| RpcStatus::internal("Native connection closed before response"))?;
        guard.armed = false;

        if reply.status.is_ok() {
            Ok(CallOutcome {
                payload: reply.payload,
                metadata: reply.metadata,
                trailers: reply.trailers,
            })
        } else {
            Err(reply.status.into())
        }
    }
}

/// Sends a `cancel` frame if the owning call future is dropped while the
/// call is still pending.
struct CancelOnDrop {
    inner: Arc<ClientInner>,
    id: u64,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let still_pending = self
            .inner
            .pending
            .lock()
            .map(|mut p| p.remove(&self.id).is_some())
            .unwrap_or(false);
        if !still_pending {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = self.inner.clone();
            let id = self.id;
            handle.spawn(async move {
                let mut writer = inner.writer.lock().await;
                if let Err(e) = write_envelope(&mut *writer, &Envelope::Cancel { id }).await {
                    tracing::debug!(id, "Failed to send cancel frame: {}", e);
                }
            });
        }
    }
}
