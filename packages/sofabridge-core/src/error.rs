//! Centralized error types for the SofaBridge core library.
//!
//! - Structured error types using `thiserror`
//! - Mapping to HTTP status codes
//! - `IntoResponse` for JSON error bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::sonos::discovery::DiscoveryError;
use crate::sonos::soap::SoapError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::SocketBind(_) => "socket_bind_failed",
            Self::SendSearch(_) => "ssdp_send_failed",
        }
    }
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault { .. } => "soap_fault",
            Self::Parse(_) => "soap_parse_error",
        }
    }
}

/// Failure taxonomy of every zone, playback and library operation.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// No player with this room name, or no favorite/playlist with this
    /// title. A normal outcome, not a fault.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A device rejected or failed a command.
    #[error("Device error {code}: {detail}")]
    DeviceError { code: String, detail: String },

    /// Content type the translator does not know.
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// No topology can be read.
    #[error("Player directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Client sent an invalid or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZoneError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::DeviceError { .. } => "device_error",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::DirectoryUnavailable(_) => "directory_unavailable",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
        }
    }

    /// A state value an operation depends on was not read from the device.
    pub fn state_unread(what: &str, room: &str) -> Self {
        Self::DeviceError {
            code: "state_unread".to_string(),
            detail: format!("{} of {} could not be read", what, room),
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DeviceError { .. } => StatusCode::BAD_GATEWAY,
            Self::UnsupportedType(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs the error at the level its kind deserves.
    pub(crate) fn log(&self, context: &str) {
        match self {
            Self::NotFound(_) | Self::InvalidRequest(_) | Self::UnsupportedType(_) => {
                log::debug!("[{}] {}", context, self)
            }
            _ => log::warn!("[{}] {}", context, self),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::sonos::discovery::DiscoveryResult;
pub use crate::sonos::soap::SoapResult;

/// Convenient Result alias for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for ZoneError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SoapError> for ZoneError {
    fn from(err: SoapError) -> Self {
        Self::DeviceError {
            code: err.device_code(),
            detail: err.to_string(),
        }
    }
}

impl From<DiscoveryError> for ZoneError {
    fn from(err: DiscoveryError) -> Self {
        Self::DirectoryUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(ZoneError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ZoneError::DeviceError {
                code: "701".into(),
                detail: "x".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ZoneError::UnsupportedType("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ZoneError::DirectoryUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn soap_fault_becomes_device_error_with_upnp_code() {
        let err: ZoneError = SoapError::Fault {
            code: Some(701),
            message: "Transition not available".into(),
        }
        .into();

        match err {
            ZoneError::DeviceError { code, detail } => {
                assert_eq!(code, "701");
                assert!(detail.contains("Transition not available"));
            }
            other => panic!("expected device error, got {:?}", other),
        }
    }

    #[test]
    fn unread_state_is_a_device_error() {
        let err = ZoneError::state_unread("group volume", "Port");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.to_string(),
            "Device error state_unread: group volume of Port could not be read"
        );
    }

    #[test]
    fn soap_error_codes() {
        assert_eq!(SoapError::Parse("x".into()).code(), "soap_parse_error");
        assert_eq!(SoapError::HttpStatus(500, String::new()).code(), "http_error_status");
    }

    #[tokio::test]
    async fn error_renders_json_body() {
        let response = ZoneError::NotFound("Garage".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "Not found: Garage");
        assert_eq!(json["status"], 404);
    }
}
