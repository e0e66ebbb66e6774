//! Native wire framing: a 4-byte big-endian length prefix followed by one
//! JSON envelope. Envelopes are tagged by `type` and matched to in-flight
//! calls by `id`, so many calls multiplex over one connection.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::rpc::status::{RpcCode, RpcStatus};

/// Upper bound on a single frame body. Oversized frames are a protocol
/// error, not an allocation request.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Status block carried in every response envelope. `code` 0 is success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireStatus {
    pub code: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl WireStatus {
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: String::new(),
            details: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<&RpcStatus> for WireStatus {
    fn from(status: &RpcStatus) -> Self {
        Self {
            code: status.code.wire_code(),
            message: status.message.clone(),
            details: status.details.clone(),
        }
    }
}

impl From<WireStatus> for RpcStatus {
    fn from(wire: WireStatus) -> Self {
        Self {
            code: RpcCode::from_wire_code(wire.code),
            message: wire.message,
            details: wire.details,
        }
    }
}

/// One frame on the native connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Request {
        id: u64,
        method: String,
        #[serde(default)]
        metadata: HashMap<String, String>,
        #[serde(default)]
        payload: serde_json::Value,
    },
    Response {
        id: u64,
        status: WireStatus,
        #[serde(default)]
        metadata: Vec<(String, String)>,
        #[serde(default)]
        trailers: Vec<(String, String)>,
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Abandons the call with the given id. The peer stops work and sends
    /// no response for it.
    Cancel { id: u64 },
}

/// Read one envelope. Returns `None` on clean EOF between frames.
pub async fn read_envelope<R>(reader: &mut R) -> io::Result<Option<Envelope>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame of {} bytes exceeds the {} byte limit", len, MAX_FRAME_LEN),
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;

    let envelope = serde_json::from_slice(&buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(envelope))
}

/// Write one envelope with its length prefix and flush.
pub async fn write_envelope<W>(writer: &mut W, envelope: &Envelope) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(envelope)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame of {} bytes exceeds the {} byte limit", body.len(), MAX_FRAME_LEN),
        ));
    }

    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn envelope_round_trips_over_a_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let sent = Envelope::Request {
            id: 7,
            method: "golinks.api.v1.ShortcutService/GetShortcut".to_string(),
            metadata: HashMap::from([("authorization".to_string(), "Bearer t".to_string())]),
            payload: serde_json::json!({"name": "docs"}),
        };
        write_envelope(&mut client, &sent).await.unwrap();

        let received = read_envelope(&mut server).await.unwrap().unwrap();
        match received {
            Envelope::Request { id, method, payload, .. } => {
                assert_eq!(id, 7);
                assert_eq!(method, "golinks.api.v1.ShortcutService/GetShortcut");
                assert_eq!(payload, serde_json::json!({"name": "docs"}));
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[tokio::test]
    async fn clean_eof_reads_as_none() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_envelope(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(
            &mut client,
            &((MAX_FRAME_LEN as u32) + 1).to_be_bytes(),
        )
        .await
        .unwrap();

        let err = read_envelope(&mut server).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        // Length says 100 bytes but only 3 arrive before EOF.
        tokio::io::AsyncWriteExt::write_all(&mut client, &100u32.to_be_bytes())
            .await
            .unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut client, b"abc")
            .await
            .unwrap();
        drop(client);

        assert!(read_envelope(&mut server).await.is_err());
    }

    #[test]
    fn wire_status_bridges_both_ways() {
        let status = RpcStatus::unauthenticated("Missing access token");
        let wire = WireStatus::from(&status);
        assert_eq!(wire.code, 16);

        let back: RpcStatus = wire.into();
        assert_eq!(back.code, RpcCode::Unauthenticated);
        assert_eq!(back.message, "Missing access token");
    }
}
