//! Volume, mute and equalizer control for Sonos speakers.
//!
//! Group-level operations go through GroupRenderingControl on the coordinator;
//! per-speaker ones through RenderingControl.

use reqwest::Client;

use crate::error::SoapResult;
use crate::sonos::services::SonosService;
use crate::sonos::soap::{SoapError, SoapRequestBuilder};
use crate::sonos::utils::extract_xml_text;

/// Clamps a requested volume to the 0..=100 range the speakers accept.
pub(crate) fn clamp_volume(requested: i32) -> u8 {
    let clamped = requested.clamp(0, 100);
    if clamped != requested {
        log::debug!("[Sonos] Volume {} clamped to {}", requested, clamped);
    }
    clamped as u8
}

/// Clamps a bass/treble level to -10..=10.
pub(crate) fn clamp_eq_level(requested: i8) -> i8 {
    requested.clamp(-10, 10)
}

fn bool_arg(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn parse_u8(response: &str, element: &str) -> SoapResult<u8> {
    extract_xml_text(response, element)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| SoapError::Parse(format!("missing or invalid {}", element)))
}

fn parse_flag(response: &str, element: &str) -> SoapResult<bool> {
    extract_xml_text(response, element)
        .map(|v| v.trim() == "1")
        .ok_or_else(|| SoapError::Parse(format!("missing {}", element)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Group Volume / Mute
// ─────────────────────────────────────────────────────────────────────────────

/// Gets the group volume from the coordinator (0-100).
pub async fn get_group_volume(client: &Client, coordinator_ip: &str) -> SoapResult<u8> {
    let response = SoapRequestBuilder::new(client, coordinator_ip)
        .service(SonosService::GroupRenderingControl)
        .action("GetGroupVolume")
        .instance_id()
        .send()
        .await?;

    parse_u8(&response, "CurrentVolume")
}

/// Sets the group volume on the coordinator. Out-of-range values are clamped.
pub async fn set_group_volume(client: &Client, coordinator_ip: &str, volume: i32) -> SoapResult<()> {
    SoapRequestBuilder::new(client, coordinator_ip)
        .service(SonosService::GroupRenderingControl)
        .action("SetGroupVolume")
        .instance_id()
        .arg("DesiredVolume", clamp_volume(volume).to_string())
        .send()
        .await?;

    Ok(())
}

pub async fn get_group_mute(client: &Client, coordinator_ip: &str) -> SoapResult<bool> {
    let response = SoapRequestBuilder::new(client, coordinator_ip)
        .service(SonosService::GroupRenderingControl)
        .action("GetGroupMute")
        .instance_id()
        .send()
        .await?;

    parse_flag(&response, "CurrentMute")
}

pub async fn set_group_mute(client: &Client, coordinator_ip: &str, mute: bool) -> SoapResult<()> {
    SoapRequestBuilder::new(client, coordinator_ip)
        .service(SonosService::GroupRenderingControl)
        .action("SetGroupMute")
        .instance_id()
        .arg("DesiredMute", bool_arg(mute))
        .send()
        .await?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-Speaker Volume / Mute
// ─────────────────────────────────────────────────────────────────────────────

/// Gets the volume of an individual speaker (0-100).
pub async fn get_speaker_volume(client: &Client, speaker_ip: &str) -> SoapResult<u8> {
    let response = SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("GetVolume")
        .instance_id()
        .master_channel()
        .send()
        .await?;

    parse_u8(&response, "CurrentVolume")
}

/// Sets the volume of an individual speaker, independent of its group.
pub async fn set_speaker_volume(client: &Client, speaker_ip: &str, volume: i32) -> SoapResult<()> {
    SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("SetVolume")
        .instance_id()
        .master_channel()
        .arg("DesiredVolume", clamp_volume(volume).to_string())
        .send()
        .await?;

    Ok(())
}

pub async fn get_speaker_mute(client: &Client, speaker_ip: &str) -> SoapResult<bool> {
    let response = SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("GetMute")
        .instance_id()
        .master_channel()
        .send()
        .await?;

    parse_flag(&response, "CurrentMute")
}

pub async fn set_speaker_mute(client: &Client, speaker_ip: &str, mute: bool) -> SoapResult<()> {
    SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("SetMute")
        .instance_id()
        .master_channel()
        .arg("DesiredMute", bool_arg(mute))
        .send()
        .await?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Equalizer
// ─────────────────────────────────────────────────────────────────────────────

pub async fn set_bass(client: &Client, speaker_ip: &str, level: i8) -> SoapResult<()> {
    SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("SetBass")
        .instance_id()
        .arg("DesiredBass", clamp_eq_level(level).to_string())
        .send()
        .await?;

    Ok(())
}

pub async fn set_treble(client: &Client, speaker_ip: &str, level: i8) -> SoapResult<()> {
    SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("SetTreble")
        .instance_id()
        .arg("DesiredTreble", clamp_eq_level(level).to_string())
        .send()
        .await?;

    Ok(())
}

pub async fn set_loudness(client: &Client, speaker_ip: &str, enabled: bool) -> SoapResult<()> {
    SoapRequestBuilder::new(client, speaker_ip)
        .service(SonosService::RenderingControl)
        .action("SetLoudness")
        .instance_id()
        .master_channel()
        .arg("DesiredLoudness", bool_arg(enabled))
        .send()
        .await?;

    Ok(())
}
