//! HTTP response helper functions for consistent API responses.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::remote::{timestamp, RemoteResult};

/// Standard API success response with JSON data.
pub fn api_success<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(data))
}

/// Success response for a room command: `{ "success": true, "room": .. }`
/// plus any extra fields.
pub fn room_ok(room: &str, extra: Value) -> impl IntoResponse {
    let mut body = json!({ "success": true, "room": room });
    if let (Some(map), Value::Object(extra)) = (body.as_object_mut(), extra) {
        map.extend(extra);
    }
    api_success(body)
}

/// Success response of the shortcut routes, stamped with the current time.
pub fn action_ok(action: &str, extra: Value) -> impl IntoResponse {
    let mut body = json!({ "success": true, "action": action });
    if let (Some(map), Value::Object(extra)) = (body.as_object_mut(), extra) {
        map.extend(extra);
    }
    body["timestamp"] = json!(timestamp());
    api_success(body)
}

/// Renders a remote command result: 200 with the acknowledgement, or 400
/// with the rejection.
pub fn remote_response(result: RemoteResult) -> impl IntoResponse {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(rejection) => (StatusCode::BAD_REQUEST, Json(rejection.body())),
    }
}

/// Standard API error response with a plain message.
pub fn api_error(status: StatusCode, message: impl std::fmt::Display) -> impl IntoResponse {
    (status, Json(json!({ "error": message.to_string() })))
}
