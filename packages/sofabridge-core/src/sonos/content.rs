//! ContentDirectory access: favorites, saved playlists, the queue and the
//! music library index.

use reqwest::Client;

use crate::error::SoapResult;
use crate::sonos::didl::parse_didl_items;
use crate::sonos::services::SonosService;
use crate::sonos::soap::{SoapError, SoapRequestBuilder};
use crate::sonos::types::{BrowseContainer, LibraryItem};
use crate::sonos::utils::extract_xml_text;

/// Browses the direct children of a container, returning at most `limit`
/// entries.
pub async fn browse(
    client: &Client,
    ip: &str,
    container: BrowseContainer,
    limit: u32,
) -> SoapResult<Vec<LibraryItem>> {
    let response = SoapRequestBuilder::new(client, ip)
        .service(SonosService::ContentDirectory)
        .action("Browse")
        .arg("ObjectID", container.object_id())
        .arg("BrowseFlag", "BrowseDirectChildren")
        .arg("Filter", "*")
        .arg("StartingIndex", "0")
        .arg("RequestedCount", limit.to_string())
        .arg("SortCriteria", "")
        .send()
        .await?;

    let result = extract_xml_text(&response, "Result")
        .ok_or_else(|| SoapError::Parse("browse response without Result".into()))?;

    let mut items = parse_didl_items(&result);
    items.truncate(limit as usize);
    log::debug!(
        "[Sonos] Browsed {} on {}: {} item(s)",
        container.object_id(),
        ip,
        items.len()
    );
    Ok(items)
}

/// Asks the speaker to rescan the music library shares.
pub async fn refresh_share_index(client: &Client, ip: &str) -> SoapResult<()> {
    log::info!("[Sonos] Refreshing music library index via {}", ip);

    SoapRequestBuilder::new(client, ip)
        .service(SonosService::ContentDirectory)
        .action("RefreshShareIndex")
        .arg("AlbumArtistDisplayOption", "")
        .send()
        .await?;
    Ok(())
}
