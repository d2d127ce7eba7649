//! Transport control commands for Sonos speakers.
//!
//! Everything here talks to AVTransport on a coordinator: play/pause, track
//! navigation, transport URIs, the queue, seek, sleep timer and play modes.

use reqwest::Client;

use crate::error::SoapResult;
use crate::sonos::services::SonosService;
use crate::sonos::soap::{SoapError, SoapRequestBuilder};
use crate::sonos::types::{PlayMode, PlaybackState};
use crate::sonos::utils::{extract_xml_text, format_hms};

fn transport<'a>(client: &'a Client, ip: &'a str) -> SoapRequestBuilder<'a> {
    SoapRequestBuilder::new(client, ip).service(SonosService::AVTransport)
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Starts or resumes playback of whatever the transport is set to.
pub async fn play(client: &Client, ip: &str) -> SoapResult<()> {
    transport(client, ip)
        .action("Play")
        .instance_id()
        .arg("Speed", "1")
        .send()
        .await?;
    Ok(())
}

pub async fn pause(client: &Client, ip: &str) -> SoapResult<()> {
    transport(client, ip).action("Pause").instance_id().send().await?;
    Ok(())
}

pub async fn next(client: &Client, ip: &str) -> SoapResult<()> {
    transport(client, ip).action("Next").instance_id().send().await?;
    Ok(())
}

pub async fn previous(client: &Client, ip: &str) -> SoapResult<()> {
    transport(client, ip).action("Previous").instance_id().send().await?;
    Ok(())
}

/// Reads `CurrentTransportState` via `GetTransportInfo`.
pub async fn get_transport_state(client: &Client, ip: &str) -> SoapResult<PlaybackState> {
    let response = transport(client, ip)
        .action("GetTransportInfo")
        .instance_id()
        .send()
        .await?;

    extract_xml_text(&response, "CurrentTransportState")
        .map(|s| PlaybackState::from_transport_state(&s))
        .ok_or_else(|| SoapError::Parse("missing CurrentTransportState".into()))
}

/// Reads the current queue track number via `GetPositionInfo`.
pub async fn get_track_number(client: &Client, ip: &str) -> SoapResult<u32> {
    let response = transport(client, ip)
        .action("GetPositionInfo")
        .instance_id()
        .send()
        .await?;

    extract_xml_text(&response, "Track")
        .and_then(|t| t.trim().parse().ok())
        .ok_or_else(|| SoapError::Parse("missing Track".into()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport URI and Queue
// ─────────────────────────────────────────────────────────────────────────────

/// Points the transport at `uri`. Does not start playback.
pub async fn set_av_transport_uri(
    client: &Client,
    ip: &str,
    uri: &str,
    metadata: Option<&str>,
) -> SoapResult<()> {
    log::info!("[Sonos] SetAVTransportURI: ip={}, uri={}", ip, uri);

    transport(client, ip)
        .action("SetAVTransportURI")
        .instance_id()
        .arg("CurrentURI", uri)
        .arg("CurrentURIMetaData", metadata.unwrap_or_default())
        .send()
        .await?;
    Ok(())
}

/// Adds `uri` to the queue. `position` 0 appends.
pub async fn add_uri_to_queue(
    client: &Client,
    ip: &str,
    uri: &str,
    metadata: Option<&str>,
    position: u32,
    as_next: bool,
) -> SoapResult<()> {
    log::info!(
        "[Sonos] AddURIToQueue: ip={}, uri={}, position={}",
        ip,
        uri,
        position
    );

    transport(client, ip)
        .action("AddURIToQueue")
        .instance_id()
        .arg("EnqueuedURI", uri)
        .arg("EnqueuedURIMetaData", metadata.unwrap_or_default())
        .arg("DesiredFirstTrackNumberEnqueued", position.to_string())
        .arg("EnqueueAsNext", if as_next { "1" } else { "0" })
        .send()
        .await?;
    Ok(())
}

pub async fn remove_all_tracks_from_queue(client: &Client, ip: &str) -> SoapResult<()> {
    transport(client, ip)
        .action("RemoveAllTracksFromQueue")
        .instance_id()
        .send()
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Seek, Sleep, Play Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Jumps to a 1-based queue track.
pub async fn seek_track(client: &Client, ip: &str, track_no: u32) -> SoapResult<()> {
    transport(client, ip)
        .action("Seek")
        .instance_id()
        .arg("Unit", "TRACK_NR")
        .arg("Target", track_no.to_string())
        .send()
        .await?;
    Ok(())
}

/// Seeks within the current track.
pub async fn seek_time(client: &Client, ip: &str, elapsed_secs: u32) -> SoapResult<()> {
    transport(client, ip)
        .action("Seek")
        .instance_id()
        .arg("Unit", "REL_TIME")
        .arg("Target", format_hms(elapsed_secs))
        .send()
        .await?;
    Ok(())
}

/// Configures the sleep timer; `None` cancels it.
pub async fn configure_sleep_timer(
    client: &Client,
    ip: &str,
    duration_secs: Option<u32>,
) -> SoapResult<()> {
    let duration = duration_secs.map(format_hms).unwrap_or_default();
    transport(client, ip)
        .action("ConfigureSleepTimer")
        .instance_id()
        .arg("NewSleepTimerDuration", duration)
        .send()
        .await?;
    Ok(())
}

pub async fn set_play_mode(client: &Client, ip: &str, mode: PlayMode) -> SoapResult<()> {
    transport(client, ip)
        .action("SetPlayMode")
        .instance_id()
        .arg("NewPlayMode", mode.as_upnp())
        .send()
        .await?;
    Ok(())
}

pub async fn set_crossfade(client: &Client, ip: &str, enabled: bool) -> SoapResult<()> {
    transport(client, ip)
        .action("SetCrossfadeMode")
        .instance_id()
        .arg("CrossfadeMode", if enabled { "1" } else { "0" })
        .send()
        .await?;
    Ok(())
}
