//! Call status codes shared by every wire encoding.
//!
//! The numeric codes ride the native protocol and the browser trailers
//! frame; the REST translator maps them onto HTTP status codes. Translators
//! re-encode statuses, they never reinterpret them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use golinks_core::auth::AuthError;
use golinks_core::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Ok,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Internal,
    Unauthenticated,
}

impl RpcCode {
    /// Numeric code carried on the wire.
    pub fn wire_code(&self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::InvalidArgument => 3,
            Self::NotFound => 5,
            Self::AlreadyExists => 6,
            Self::PermissionDenied => 7,
            Self::Internal => 13,
            Self::Unauthenticated => 16,
        }
    }

    /// Decode a wire code. Unrecognized codes collapse to `Internal` so a
    /// misbehaving peer surfaces as a server-side error, never a success.
    pub fn from_wire_code(code: u32) -> Self {
        match code {
            0 => Self::Ok,
            3 => Self::InvalidArgument,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            13 => Self::Internal,
            16 => Self::Unauthenticated,
            _ => Self::Internal,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::Internal => "internal",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

/// A failed (or in the `Ok` case, successful) call outcome as seen by
/// translators. Carries an optional structured detail payload, e.g. the
/// name of an offending parameter.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{}: {message}", .code.as_str())]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(RpcCode::AlreadyExists, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RpcCode::PermissionDenied, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unauthenticated, message)
    }
}

impl From<ServerError> for RpcStatus {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::NotFound(msg) => Self::not_found(msg),
            ServerError::BadRequest(msg) => Self::invalid_argument(msg),
            ServerError::AlreadyExists(msg) => Self::already_exists(msg),
            ServerError::PermissionDenied(msg) => Self::permission_denied(msg),
            ServerError::Database(msg) => Self::internal(msg),
            ServerError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<AuthError> for RpcStatus {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::Expired => {
                Self::unauthenticated(err.to_string())
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

/// REST representation: HTTP status from the code plus a structured JSON
/// body `{kind, message, details?}`.
impl IntoResponse for RpcStatus {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "kind": self.code.as_str(),
            "message": self.message,
            "details": self.details,
        });
        (self.code.http_status(), axum::Json(body)).into_response()
    }
}
