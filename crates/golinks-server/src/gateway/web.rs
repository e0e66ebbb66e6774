//! Browser-framing adapter: the same RPC core behind a framed HTTP
//! encoding that restricted browser transports can speak.
//!
//! Request and response bodies are sequences of frames, each a 1-byte flag
//! (0x00 data, 0x80 trailers) plus a 4-byte big-endian length and payload.
//! With a `-text` content type the whole body is base64. The HTTP status
//! is always 200; the call status rides in the trailers frame as
//! `rpc-status` / `rpc-message` lines.

use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};

use crate::native::{CallOutcome, MAX_FRAME_LEN};
use crate::rpc::{RpcCode, RpcStatus};

use super::header_metadata;
use super::invoker::CoreInvoker;

/// First path segment shared by every browser-framing route.
pub const SERVICE_PREFIX: &str = "golinks.api.v1.";

const FRAME_DATA: u8 = 0x00;
const FRAME_TRAILERS: u8 = 0x80;

const DEFAULT_CONTENT_TYPE: &str = "application/grpc-web+json";

#[derive(Clone)]
struct WebState {
    invoker: Arc<dyn CoreInvoker>,
}

/// Routes for the framed surface: `POST /<service>/<method>` where the
/// service segment carries the full dotted service name.
pub fn router(invoker: Arc<dyn CoreInvoker>) -> Router {
    Router::new()
        .route("/{service}/{method}", post(handle))
        .with_state(WebState { invoker })
}

async fn handle(
    State(state): State<WebState>,
    Path((service, method)): Path<(String, String)>,
    req: Request,
) -> Response {
    if !service.starts_with(SERVICE_PREFIX) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let method_name = format!("{}/{}", service, method);

    let (parts, body) = req.into_parts();
    let metadata = header_metadata(&parts.headers);

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let text_mode = content_type.contains("-text");

    let raw_body = match axum::body::to_bytes(body, MAX_FRAME_LEN).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = RpcStatus::invalid_argument(format!("Failed to read request body: {}", e));
            return framed_error(&content_type, text_mode, &status);
        }
    };

    let payload = match decode_request(raw_body, text_mode) {
        Ok(payload) => payload,
        Err(status) => return framed_error(&content_type, text_mode, &status),
    };

    match state.invoker.invoke(&method_name, metadata, payload).await {
        Ok(outcome) => framed_success(&content_type, text_mode, &outcome),
        Err(status) => framed_error(&content_type, text_mode, &status),
    }
}

/// Unwrap the framed (and possibly base64) request body into the call
/// payload. Data frames concatenate; client trailer frames are ignored.
fn decode_request(raw: Bytes, text_mode: bool) -> Result<serde_json::Value, RpcStatus> {
    let framed = if text_mode {
        let compact: Vec<u8> = raw
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        Bytes::from(
            BASE64
                .decode(compact)
                .map_err(|e| RpcStatus::invalid_argument(format!("Invalid base64 body: {}", e)))?,
        )
    } else {
        raw
    };

    let mut data = BytesMut::new();
    for (flag, payload) in parse_frames(&framed)? {
        if flag & FRAME_TRAILERS == 0 {
            data.extend_from_slice(&payload);
        }
    }

    if data.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_slice(&data)
        .map_err(|e| RpcStatus::invalid_argument(format!("Malformed request payload: {}", e)))
}

fn parse_frames(body: &Bytes) -> Result<Vec<(u8, Bytes)>, RpcStatus> {
    let mut frames = Vec::new();
    let mut offset = 0usize;

    while offset < body.len() {
        if body.len() - offset < 5 {
            return Err(RpcStatus::invalid_argument("Truncated frame header"));
        }
        let flag = body[offset];
        let len = u32::from_be_bytes([
            body[offset + 1],
            body[offset + 2],
            body[offset + 3],
            body[offset + 4],
        ]) as usize;
        offset += 5;

        if len > MAX_FRAME_LEN || body.len() - offset < len {
            return Err(RpcStatus::invalid_argument("Truncated frame payload"));
        }
        frames.push((flag, body.slice(offset..offset + len)));
        offset += len;
    }
    Ok(frames)
}

fn encode_frame(flag: u8, payload: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(5 + payload.len());
    frame.put_u8(flag);
    frame.put_u32(payload.len() as u32);
    frame.extend_from_slice(payload);
    frame
}

/// The trailers block: `rpc-status` first, then `rpc-message` for errors,
/// then any accumulated trailer metadata, one `key: value` line each.
fn trailers_block(code: RpcCode, message: &str, trailers: &[(String, String)]) -> BytesMut {
    let mut block = String::new();
    block.push_str(&format!("rpc-status: {}\r\n", code.wire_code()));
    if !message.is_empty() {
        block.push_str(&format!("rpc-message: {}\r\n", message));
    }
    for (key, value) in trailers {
        block.push_str(&format!("{}: {}\r\n", key, value));
    }
    encode_frame(FRAME_TRAILERS, block.as_bytes())
}

fn framed_success(content_type: &str, text_mode: bool, outcome: &CallOutcome) -> Response {
    let payload = serde_json::to_vec(&outcome.payload).unwrap_or_default();
    let mut body = encode_frame(FRAME_DATA, &payload);
    body.extend_from_slice(&trailers_block(RpcCode::Ok, "", &outcome.trailers));

    let mut headers = HeaderMap::new();
    for (key, value) in &outcome.metadata {
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::try_from(key.as_str()),
            axum::http::HeaderValue::try_from(value.as_str()),
        ) {
            headers.append(name, value);
        }
    }
    respond(content_type, text_mode, headers, body)
}

fn framed_error(content_type: &str, text_mode: bool, status: &RpcStatus) -> Response {
    let body = trailers_block(status.code, &status.message, &[]);
    respond(content_type, text_mode, HeaderMap::new(), body)
}

fn respond(content_type: &str, text_mode: bool, mut headers: HeaderMap, body: BytesMut) -> Response {
    let body = if text_mode {
        BASE64.encode(&body).into_bytes()
    } else {
        body.to_vec()
    };
    if let Ok(ct) = axum::http::HeaderValue::try_from(content_type) {
        headers.insert(CONTENT_TYPE, ct);
    }
    (StatusCode::OK, headers, body).into_response()
}
