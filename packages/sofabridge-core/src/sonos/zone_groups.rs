//! Zone group topology parsing and retrieval.
//!
//! Turns `ZoneGroupState` XML into raw `ZoneGroup` data. State reads (volume,
//! transport) happen later in the directory.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;

use crate::error::SoapResult;
use crate::sonos::services::SonosService;
use crate::sonos::soap::SoapRequestBuilder;
use crate::sonos::types::{ZoneGroup, ZoneGroupMember};
use crate::sonos::utils::{extract_ip_from_location, extract_xml_text, get_xml_attr};

/// Parses ZoneGroupState XML (already unescaped) into zone groups.
///
/// # Filtering
/// - Zone Bridges (`IsZoneBridge="1"`) cannot play audio and are dropped.
/// - Invisible members (`Invisible="1"`, e.g. the hidden half of a stereo
///   pair or home theater satellites) are dropped.
/// - Members missing `UUID`, `Location` or `ZoneName` are dropped.
/// - Groups left without a visible coordinator are excluded.
pub fn parse_zone_group_xml(xml: &str) -> Vec<ZoneGroup> {
    let mut groups = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut group_id = String::new();
    let mut coordinator_uuid: Option<String> = None;
    let mut members: Vec<ZoneGroupMember> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"ZoneGroup" => {
                    group_id = get_xml_attr(e, b"ID").unwrap_or_default();
                    coordinator_uuid = get_xml_attr(e, b"Coordinator");
                    members.clear();
                }
                b"ZoneGroupMember" => {
                    if get_xml_attr(e, b"IsZoneBridge").as_deref() == Some("1")
                        || get_xml_attr(e, b"Invisible").as_deref() == Some("1")
                    {
                        continue;
                    }

                    let Some(uuid) = get_xml_attr(e, b"UUID") else {
                        continue;
                    };
                    let Some(ip) =
                        get_xml_attr(e, b"Location").and_then(|l| extract_ip_from_location(&l))
                    else {
                        continue;
                    };
                    let Some(zone_name) = get_xml_attr(e, b"ZoneName") else {
                        continue;
                    };

                    members.push(ZoneGroupMember {
                        uuid,
                        ip,
                        zone_name,
                    });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"ZoneGroup" => {
                let Some(coord_uuid) = coordinator_uuid.take() else {
                    continue;
                };
                let coordinator_ip = members
                    .iter()
                    .find(|m| m.uuid == coord_uuid)
                    .map(|m| m.ip.clone());

                match coordinator_ip {
                    Some(ip) => groups.push(ZoneGroup {
                        id: std::mem::take(&mut group_id),
                        coordinator_uuid: coord_uuid,
                        coordinator_ip: ip,
                        members: std::mem::take(&mut members),
                    }),
                    None => {
                        log::debug!(
                            "[Sonos] Skipping zone group {} without a visible coordinator",
                            group_id
                        );
                        members.clear();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("[Sonos] XML parse error in zone groups: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    groups
}

/// Fetches the current zone groups from a Sonos speaker.
pub async fn get_zone_groups(client: &Client, ip: &str) -> SoapResult<Vec<ZoneGroup>> {
    let response = SoapRequestBuilder::new(client, ip)
        .service(SonosService::ZoneGroupTopology)
        .action("GetZoneGroupState")
        .send()
        .await?;

    let Some(state_xml) = extract_xml_text(&response, "ZoneGroupState") else {
        return Ok(vec![]);
    };

    Ok(parse_zone_group_xml(&state_xml))
}
