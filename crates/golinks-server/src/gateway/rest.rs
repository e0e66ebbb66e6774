//! HTTP/JSON REST translator: one generic handler that turns any request
//! under `/api/v1` into an RPC call using the pattern registry, then turns
//! the outcome back into HTTP. There are no per-method handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::native::MAX_FRAME_LEN;
use crate::rpc::RpcStatus;

use super::header_metadata;
use super::invoker::CoreInvoker;
use super::pattern::{BodyMapping, PatternRegistry, VarKind};

#[derive(Clone)]
struct RestState {
    registry: Arc<PatternRegistry>,
    invoker: Arc<dyn CoreInvoker>,
}

/// Build the REST router. Every path under the mount point funnels into
/// the same translate handler.
pub fn router(registry: Arc<PatternRegistry>, invoker: Arc<dyn CoreInvoker>) -> Router {
    Router::new()
        .fallback(translate)
        .with_state(RestState { registry, invoker })
}

/// A request successfully translated into a dispatchable call.
#[derive(Debug, PartialEq)]
struct TranslatedCall {
    method_name: String,
    request: serde_json::Value,
}

async fn translate(State(state): State<RestState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let metadata = header_metadata(&parts.headers);

    let body_bytes = match axum::body::to_bytes(body, MAX_FRAME_LEN).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return RpcStatus::invalid_argument(format!("Failed to read request body: {}", e))
                .into_response()
        }
    };

    let translated = match translate_request(
        &state.registry,
        &parts.method,
        parts.uri.path(),
        parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        &body_bytes,
    ) {
        Ok(call) => call,
        Err(status) => return status.into_response(),
    };

    match state
        .invoker
        .invoke(&translated.method_name, metadata, translated.request)
        .await
    {
        Ok(outcome) => {
            let mut headers = HeaderMap::new();
            for (key, value) in outcome.metadata {
                insert_header(&mut headers, &key, &value);
            }
            for (key, value) in outcome.trailers {
                insert_header(&mut headers, &format!("x-rpc-trailer-{}", key), &value);
            }
            (StatusCode::OK, headers, axum::Json(outcome.payload)).into_response()
        }
        Err(status) => status.into_response(),
    }
}

/// Pure translation step: registry lookup, variable conversion, body
/// mapping. No I/O and no shared mutable state.
fn translate_request(
    registry: &PatternRegistry,
    verb: &Method,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<TranslatedCall, RpcStatus> {
    let resolved = registry
        .resolve(verb, path)
        .ok_or_else(|| RpcStatus::not_found(format!("No route for {} {}", verb, path)))?;

    // An empty body means "no additional fields". A non-empty body must be
    // JSON, and declared as such if a content type is present at all.
    let body_value = if body.is_empty() || resolved.body == BodyMapping::None {
        None
    } else {
        if let Some(ct) = content_type {
            if !ct.trim_start().starts_with("application/json") {
                return Err(RpcStatus::invalid_argument(format!(
                    "Unsupported content type: {}",
                    ct
                )));
            }
        }
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| RpcStatus::invalid_argument(format!("Malformed JSON body: {}", e)))?;
        Some(value)
    };

    let mut request = match (&resolved.body, body_value) {
        (BodyMapping::Whole, Some(value)) => match value {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(RpcStatus::invalid_argument(
                    "Request body must be a JSON object",
                ))
            }
        },
        (BodyMapping::Field(field), Some(value)) => {
            let mut map = serde_json::Map::new();
            map.insert(field.clone(), value);
            map
        }
        _ => serde_json::Map::new(),
    };

    for var in &resolved.variables {
        let value = match var.kind {
            VarKind::Str => serde_json::Value::String(var.raw.clone()),
            VarKind::Int => {
                let n: i64 = var.raw.parse().map_err(|_| {
                    RpcStatus::invalid_argument(format!("type mismatch, parameter: {}", var.name))
                        .with_details(serde_json::json!({ "parameter": var.name }))
                })?;
                serde_json::Value::from(n)
            }
        };
        request.insert(var.name.clone(), value);
    }

    Ok(TranslatedCall {
        method_name: resolved.method_name,
        request: serde_json::Value::Object(request),
    })
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    match (HeaderName::try_from(key), HeaderValue::try_from(value)) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => tracing::debug!(key, "Skipping unrepresentable response header"),
    }
}
