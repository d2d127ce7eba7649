//! SOAP transport for UPnP/Sonos control requests.
//!
//! Builds envelopes, posts them to the speaker and turns SOAP faults into
//! typed errors carrying the UPnP error code. Commands are sent exactly once;
//! callers decide what a failure means.

use std::time::{Duration, Instant};

use reqwest::Client;
use thiserror::Error;

use super::services::SonosService;
use super::utils::{build_sonos_url, escape_xml, extract_xml_text};
use crate::protocol_constants::SOAP_TIMEOUT_SECS;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while talking SOAP to a speaker.
#[derive(Debug, Error)]
pub enum SoapError {
    /// The HTTP exchange itself failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without a SOAP fault body.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// The speaker answered with a SOAP fault.
    #[error("SOAP fault{}: {message}", fault_code_suffix(.code))]
    Fault {
        /// UPnP `errorCode` from the fault detail, when present.
        code: Option<u16>,
        message: String,
    },

    /// The response could not be interpreted.
    #[error("Failed to parse SOAP response: {0}")]
    Parse(String),
}

fn fault_code_suffix(code: &Option<u16>) -> String {
    code.map(|c| format!(" {}", c)).unwrap_or_default()
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// Short machine-readable code for the failure, used as the `code` half of
    /// a device error.
    #[must_use]
    pub fn device_code(&self) -> String {
        match self {
            SoapError::Http(e) if e.is_timeout() => "timeout".to_string(),
            SoapError::Http(_) => "unreachable".to_string(),
            SoapError::HttpStatus(status, _) => format!("http_{}", status),
            SoapError::Fault { code: Some(c), .. } => c.to_string(),
            SoapError::Fault { code: None, .. } => "soap_fault".to_string(),
            SoapError::Parse(_) => "bad_response".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request/Response
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the single-line SOAP envelope for an action.
///
/// Sonos rejects envelopes with whitespace ahead of the root element.
fn build_envelope(service_urn: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_urn}">"#
    );
    for (name, value) in args {
        body.push_str(&format!("<{name}>{}</{name}>", escape_xml(value)));
    }
    body.push_str(&format!("</u:{action}></s:Body></s:Envelope>"));
    body
}

/// Sends one SOAP request to a speaker and returns the response body.
///
/// # Errors
/// `SoapError::Fault` when the body contains a SOAP fault (checked before the
/// HTTP status, since Sonos reports faults with a 500), `HttpStatus` for other
/// non-2xx responses and `Http` for transport failures.
pub async fn send_soap_request(
    client: &Client,
    ip: &str,
    service: SonosService,
    action: &str,
    args: &[(&str, &str)],
) -> SoapResult<String> {
    let url = build_sonos_url(ip, service.control_path());
    let body = build_envelope(service.urn(), action, args);

    log::debug!("[SOAP] {} -> {} ({} bytes)", action, url, body.len());

    let start = Instant::now();
    let res = client
        .post(&url)
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .header("SOAPAction", format!("\"{}#{}\"", service.urn(), action))
        .body(body)
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .send()
        .await;

    log::debug!(
        "[SOAP] {} on {} finished in {:?}: {:?}",
        action,
        ip,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status();
    let text = res.text().await?;

    if let Some(fault) = parse_fault(&text) {
        log::warn!("[SOAP] {} on {} rejected: {}", action, ip, fault);
        return Err(fault);
    }

    if !status.is_success() {
        return Err(SoapError::HttpStatus(status.as_u16(), text));
    }

    Ok(text)
}

/// Returns the fault carried by a response body, if any.
fn parse_fault(xml: &str) -> Option<SoapError> {
    if !(xml.contains(":Fault>") || xml.contains("<Fault>")) {
        return None;
    }
    let message =
        extract_xml_text(xml, "faultstring").unwrap_or_else(|| "Unknown SOAP fault".to_string());
    let code = extract_xml_text(xml, "errorCode").and_then(|c| c.trim().parse().ok());
    Some(SoapError::Fault { code, message })
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Fluent builder for SOAP calls.
///
/// ```ignore
/// let response = SoapRequestBuilder::new(&client, "192.168.1.100")
///     .service(SonosService::AVTransport)
///     .action("Play")
///     .instance_id()
///     .arg("Speed", "1")
///     .send()
///     .await?;
/// ```
pub struct SoapRequestBuilder<'a> {
    client: &'a Client,
    ip: &'a str,
    service: Option<SonosService>,
    action: Option<&'a str>,
    args: Vec<(&'a str, String)>,
}

impl<'a> SoapRequestBuilder<'a> {
    #[must_use]
    pub fn new(client: &'a Client, ip: &'a str) -> Self {
        Self {
            client,
            ip,
            service: None,
            action: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn service(mut self, service: SonosService) -> Self {
        self.service = Some(service);
        self
    }

    #[must_use]
    pub fn action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds an argument. Arguments keep insertion order in the envelope.
    #[must_use]
    pub fn arg(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Adds `InstanceID=0`, required by every AVTransport and rendering action.
    #[must_use]
    pub fn instance_id(self) -> Self {
        self.arg("InstanceID", "0")
    }

    /// Adds `Channel=Master` for per-speaker rendering actions.
    #[must_use]
    pub fn master_channel(self) -> Self {
        self.arg("Channel", "Master")
    }

    /// Sends the request.
    ///
    /// # Errors
    /// `SoapError::Parse` if service or action were never set, otherwise
    /// whatever [`send_soap_request`] returns.
    pub async fn send(self) -> SoapResult<String> {
        let service = self
            .service
            .ok_or_else(|| SoapError::Parse("request built without a service".into()))?;
        let action = self
            .action
            .ok_or_else(|| SoapError::Parse("request built without an action".into()))?;

        let args: Vec<(&str, &str)> = self.args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        send_soap_request(self.client, self.ip, service, action, &args).await
    }

    /// Returns `(service, action, args)` without sending.
    #[cfg(test)]
    pub fn into_parts(self) -> Option<(SonosService, &'a str, Vec<(&'a str, String)>)> {
        Some((self.service?, self.action?, self.args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_single_line_and_escapes_args() {
        let body = build_envelope(
            SonosService::AVTransport.urn(),
            "SetAVTransportURI",
            &[("InstanceID", "0"), ("CurrentURI", "x-rincon:RINCON_1&a")],
        );
        assert!(body.starts_with("<?xml"));
        assert!(!body.contains('\n'));
        assert!(body.contains(r#"<u:SetAVTransportURI xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">"#));
        assert!(body.contains("<InstanceID>0</InstanceID><CurrentURI>x-rincon:RINCON_1&amp;a</CurrentURI>"));
        assert!(body.ends_with("</u:SetAVTransportURI></s:Body></s:Envelope>"));
    }

    #[test]
    fn fault_carries_upnp_error_code() {
        let xml = r#"<s:Envelope><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
        match parse_fault(xml) {
            Some(SoapError::Fault { code, message }) => {
                assert_eq!(code, Some(701));
                assert_eq!(message, "UPnPError");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn regular_response_is_not_a_fault() {
        let xml = r#"<s:Envelope><s:Body><u:PlayResponse/></s:Body></s:Envelope>"#;
        assert!(parse_fault(xml).is_none());
    }

    #[test]
    fn device_codes() {
        let fault = SoapError::Fault {
            code: Some(800),
            message: "x".into(),
        };
        assert_eq!(fault.device_code(), "800");
        assert_eq!(SoapError::HttpStatus(404, String::new()).device_code(), "http_404");
        assert_eq!(SoapError::Parse("x".into()).device_code(), "bad_response");
    }

    #[test]
    fn builder_keeps_argument_order() {
        let client = Client::new();
        let (service, action, args) = SoapRequestBuilder::new(&client, "192.168.1.100")
            .service(SonosService::RenderingControl)
            .action("SetVolume")
            .instance_id()
            .master_channel()
            .arg("DesiredVolume", "75")
            .into_parts()
            .expect("parts");

        assert_eq!(service, SonosService::RenderingControl);
        assert_eq!(action, "SetVolume");
        assert_eq!(
            args,
            vec![
                ("InstanceID", "0".to_string()),
                ("Channel", "Master".to_string()),
                ("DesiredVolume", "75".to_string()),
            ]
        );
    }

    #[test]
    fn builder_without_action_has_no_parts() {
        let client = Client::new();
        let parts = SoapRequestBuilder::new(&client, "192.168.1.100")
            .service(SonosService::AVTransport)
            .into_parts();
        assert!(parts.is_none());
    }
}
