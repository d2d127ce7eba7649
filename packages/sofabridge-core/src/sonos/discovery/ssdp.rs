//! SSDP multicast discovery of Sonos players.
//!
//! Sends M-SEARCH for the ZonePlayer device type to 239.255.255.250:1900 and
//! collects the `LOCATION` of every Sonos responder. The same socket sends and
//! receives since devices reply unicast to the sending port.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::{DiscoveryError, DiscoveryResult, SsdpConfig};
use crate::protocol_constants::{
    SONOS_SEARCH_TARGET, SSDP_MULTICAST_ADDR, SSDP_MULTICAST_TTL, SSDP_PORT,
};
use crate::sonos::utils::extract_ip_from_location;

/// Builds the M-SEARCH message.
fn build_msearch_message(mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\r\n",
        SSDP_MULTICAST_ADDR, SSDP_PORT, mx, SONOS_SEARCH_TARGET
    )
}

/// Returns the header value for `name` (case-insensitive).
fn header_value<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// Extracts the speaker address from an SSDP response.
///
/// Only responses that identify as Sonos (a `RINCON_` USN or a Sonos server
/// header) count; the address comes from `LOCATION`, falling back to the
/// source address of the datagram.
fn parse_ssdp_response(response: &str, src_ip: &str) -> Option<String> {
    let usn = header_value(response, "usn").unwrap_or_default();
    let server = header_value(response, "server").unwrap_or_default();
    let is_sonos =
        usn.contains("RINCON_") || server.to_ascii_lowercase().contains("sonos");
    if !is_sonos {
        return None;
    }

    header_value(response, "location")
        .and_then(extract_ip_from_location)
        .or_else(|| Some(src_ip.to_string()))
}

/// Creates the UDP socket used for search and responses.
fn create_socket() -> DiscoveryResult<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("[Discovery] Failed to set SO_REUSEADDR: {}", e);
    }
    if let Err(e) = socket.set_multicast_ttl_v4(SSDP_MULTICAST_TTL) {
        log::warn!("[Discovery] Failed to set multicast TTL: {}", e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;
    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

/// Discovers Sonos speakers and returns their IP addresses, deduplicated and
/// sorted.
pub async fn discover_speakers(config: &SsdpConfig) -> DiscoveryResult<Vec<String>> {
    let socket = create_socket()?;
    let msg = build_msearch_message(config.mx_value);
    let target = format!("{}:{}", SSDP_MULTICAST_ADDR, SSDP_PORT);

    log::info!(
        "[Discovery] SSDP search for {} ({}ms window)",
        SONOS_SEARCH_TARGET,
        config.discovery_timeout.as_millis()
    );

    let send = async {
        for attempt in 0..config.send_count {
            if attempt > 0 {
                tokio::time::sleep(config.retry_delay).await;
            }
            socket
                .send_to(msg.as_bytes(), &target)
                .await
                .map_err(DiscoveryError::SendSearch)?;
        }
        Ok::<(), DiscoveryError>(())
    };

    let recv = async {
        let mut found: Vec<String> = Vec::new();
        let mut buf = [0u8; 2048];
        let start = Instant::now();

        while start.elapsed() < config.discovery_timeout {
            let remaining = config.discovery_timeout.saturating_sub(start.elapsed());
            match timeout(remaining, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, src))) => {
                    let response = String::from_utf8_lossy(&buf[..len]);
                    if let Some(ip) = parse_ssdp_response(&response, &src.ip().to_string()) {
                        if !found.contains(&ip) {
                            log::debug!("[Discovery] Found speaker at {}", ip);
                            found.push(ip);
                        }
                    }
                }
                Ok(Err(e)) => log::warn!("[Discovery] Socket recv error: {}", e),
                Err(_) => break,
            }
        }
        found
    };

    let (sent, mut found) = tokio::join!(send, recv);
    sent?;

    found.sort();
    log::info!("[Discovery] {} speaker(s) answered", found.len());
    Ok(found)
}
