//! Universal remote surface for non-speaker devices.
//!
//! Commands are validated and acknowledged; no device sits behind them yet,
//! so an accepted command is logged and echoed back with a timestamp.

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

pub const VALID_SOURCES: &[&str] = &["hdmi1", "hdmi2", "hdmi3", "usb", "bluetooth", "aux"];

pub const VALID_DIRECTIONS: &[&str] = &[
    "up", "down", "left", "right", "select", "back", "home", "menu",
];

const SWITCH_ACTIONS: &[&str] = &["on", "off", "toggle"];

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A rejected remote command, rendered as HTTP 400.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRejection {
    pub error: &'static str,
    /// Accepted values, listed under this key in the response body.
    pub valid: Option<(&'static str, &'static [&'static str])>,
}

impl RemoteRejection {
    fn new(error: &'static str) -> Self {
        Self { error, valid: None }
    }

    fn listing(error: &'static str, key: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            error,
            valid: Some((key, values)),
        }
    }

    pub fn body(&self) -> Value {
        let mut body = json!({ "error": self.error });
        if let Some((key, values)) = self.valid {
            body[key] = json!(values);
        }
        body
    }
}

pub type RemoteResult = Result<Value, RemoteRejection>;

/// Body of the action-style endpoints (`power`, `volume`, `mute`, `channel`).
#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub level: Option<Value>,
    #[serde(default)]
    pub number: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InputRequest {
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NavigateRequest {
    #[serde(default)]
    pub direction: Option<String>,
}

fn ack(fields: Value) -> Value {
    let mut body = json!({ "success": true });
    if let (Some(body_map), Value::Object(extra)) = (body.as_object_mut(), fields) {
        body_map.extend(extra);
    }
    body["timestamp"] = json!(timestamp());
    body
}

fn switch(kind: &'static str, action: Option<&str>, error: &'static str) -> RemoteResult {
    match action {
        Some(a) if SWITCH_ACTIONS.contains(&a) => {
            log::info!("[Remote] {} {}", kind, a);
            Ok(ack(json!({ "action": a })))
        }
        _ => Err(RemoteRejection::new(error)),
    }
}

pub fn power(req: &ActionRequest) -> RemoteResult {
    switch("Power", req.action.as_deref(), "Invalid power action")
}

pub fn mute(req: &ActionRequest) -> RemoteResult {
    switch("Mute", req.action.as_deref(), "Invalid mute action")
}

/// `up`, `down`, or `set` with a numeric `level` in 0..=100.
pub fn volume(req: &ActionRequest) -> RemoteResult {
    let action = req.action.as_deref();
    match action {
        Some("up") | Some("down") => {}
        Some("set") => {
            let in_range = req
                .level
                .as_ref()
                .and_then(Value::as_f64)
                .is_some_and(|l| (0.0..=100.0).contains(&l));
            if !in_range {
                return Err(RemoteRejection::new("Invalid volume level (0-100)"));
            }
        }
        _ => return Err(RemoteRejection::new("Invalid volume action")),
    }
    log::info!("[Remote] Volume {:?} (level: {:?})", action, req.level);
    Ok(ack(json!({ "action": action, "level": req.level })))
}

/// `up`, `down`, or `set` with a positive channel `number`.
pub fn channel(req: &ActionRequest) -> RemoteResult {
    let action = req.action.as_deref();
    match action {
        Some("up") | Some("down") => {}
        Some("set") => {
            let valid = req
                .number
                .as_ref()
                .and_then(Value::as_f64)
                .is_some_and(|n| n > 0.0);
            if !valid {
                return Err(RemoteRejection::new("Invalid channel number"));
            }
        }
        _ => return Err(RemoteRejection::new("Invalid channel action")),
    }
    log::info!("[Remote] Channel {:?} (number: {:?})", action, req.number);
    Ok(ack(json!({ "action": action, "number": req.number })))
}

pub fn input(req: &InputRequest) -> RemoteResult {
    match req.source.as_deref() {
        Some(s) if VALID_SOURCES.contains(&s) => {
            log::info!("[Remote] Switching to input {}", s);
            Ok(ack(json!({ "source": s })))
        }
        _ => Err(RemoteRejection::listing(
            "Invalid source",
            "validSources",
            VALID_SOURCES,
        )),
    }
}

pub fn navigate(req: &NavigateRequest) -> RemoteResult {
    match req.direction.as_deref() {
        Some(d) if VALID_DIRECTIONS.contains(&d) => {
            log::info!("[Remote] Navigate {}", d);
            Ok(ack(json!({ "direction": d })))
        }
        _ => Err(RemoteRejection::listing(
            "Invalid direction",
            "validDirections",
            VALID_DIRECTIONS,
        )),
    }
}

/// Free-form command; the payload is echoed back.
pub fn command(name: &str, payload: Value) -> Value {
    log::info!("[Remote] Custom command {}: {}", name, payload);
    ack(json!({ "command": name, "payload": payload }))
}

/// GET variant of the power command. Accepts any action, like the POST
/// route's historical GET twin.
pub fn power_get(action: &str) -> Value {
    log::info!("[Remote] GET power {}", action);
    ack(json!({ "action": action, "method": "GET" }))
}
