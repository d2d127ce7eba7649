//! Group membership commands.
//!
//! A player joins a zone by pointing its transport at the coordinator with the
//! `x-rincon:` scheme and leaves by becoming coordinator of its own group.

use reqwest::Client;

use crate::error::SoapResult;
use crate::protocol_constants::RINCON_GROUP_PREFIX;
use crate::sonos::services::SonosService;
use crate::sonos::soap::SoapRequestBuilder;

/// Transport URI that makes a player follow `coordinator_uuid`.
pub fn group_uri(coordinator_uuid: &str) -> String {
    format!("{}{}", RINCON_GROUP_PREFIX, coordinator_uuid)
}

/// Joins the speaker at `ip` to the zone led by `coordinator_uuid`.
///
/// Unlike a transport change this does not start playback; the player simply
/// follows whatever the coordinator is doing.
pub async fn join_group(client: &Client, ip: &str, coordinator_uuid: &str) -> SoapResult<()> {
    let uri = group_uri(coordinator_uuid);
    log::info!("[Sonos] Joining {} to coordinator {}", ip, coordinator_uuid);

    SoapRequestBuilder::new(client, ip)
        .service(SonosService::AVTransport)
        .action("SetAVTransportURI")
        .instance_id()
        .arg("CurrentURI", uri)
        .arg("CurrentURIMetaData", "")
        .send()
        .await?;

    Ok(())
}

/// Makes the speaker at `ip` leave its group and become standalone.
///
/// Idempotent: a standalone speaker stays standalone.
pub async fn leave_group(client: &Client, ip: &str) -> SoapResult<()> {
    log::info!("[Sonos] Speaker {} leaving group", ip);

    SoapRequestBuilder::new(client, ip)
        .service(SonosService::AVTransport)
        .action("BecomeCoordinatorOfStandaloneGroup")
        .instance_id()
        .send()
        .await?;

    Ok(())
}
