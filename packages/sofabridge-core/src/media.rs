//! Music-service URI translation.
//!
//! Turns `service:type:id` identifiers (as copied from the Spotify app) into
//! the native URI and DIDL-Lite metadata a Sonos player needs to enqueue
//! them. Translation is pure: no network, no state.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::SpotifyConfig;
use crate::error::{ZoneError, ZoneResult};
use crate::protocol_constants::{TUNEIN_DESCRIPTOR, TUNEIN_SERVICE_ID};
use crate::sonos::didl::{format_didl_item, DidlItem};

/// Kinds of content a service URI can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Track,
    Album,
    Artist,
    Playlist,
}

impl ContentKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
        }
    }

    /// Containers expand into several queue entries when enqueued.
    pub fn is_container(self) -> bool {
        self != Self::Track
    }

    fn item_prefix(self) -> &'static str {
        match self {
            Self::Track => "00032020",
            Self::Album | Self::Artist => "1004206c",
            Self::Playlist => "1006206c",
        }
    }

    fn upnp_class(self) -> &'static str {
        match self {
            Self::Track => "object.item.audioItem.musicTrack",
            Self::Album => "object.container.album.musicAlbum",
            Self::Artist => "object.container.person.musicArtist",
            Self::Playlist => "object.container.playlistContainer",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "track" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "playlist" => Ok(Self::Playlist),
            _ => Err(ZoneError::UnsupportedType(s.to_string())),
        }
    }
}

/// A parsed `service:type:id` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUri<'a> {
    pub service: &'a str,
    pub kind: ContentKind,
    pub id: &'a str,
}

impl<'a> ServiceUri<'a> {
    /// Parses `service:type:id[:extra]`, plus the legacy
    /// `service:user:{user}:playlist:{id}` playlist form.
    pub fn parse(uri: &'a str) -> ZoneResult<Self> {
        let parts: Vec<&str> = uri.trim().split(':').collect();
        if parts.len() < 3 || parts.iter().take(3).any(|p| p.is_empty()) {
            return Err(ZoneError::InvalidRequest(format!(
                "expected service:type:id, got '{}'",
                uri
            )));
        }

        let (kind, id) = if parts[1] == "user" && parts.len() >= 5 {
            (parts[3], parts[4])
        } else {
            (parts[1], parts[2])
        };
        if id.is_empty() {
            return Err(ZoneError::InvalidRequest(format!("missing id in '{}'", uri)));
        }

        Ok(Self {
            service: parts[0],
            kind: kind.parse()?,
            id,
        })
    }
}

/// A playable URI with the metadata Sonos expects alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedMedia {
    pub kind: Option<ContentKind>,
    pub uri: String,
    pub metadata: String,
}

/// Translates Spotify identifiers for the account configured in
/// [`SpotifyConfig`].
#[derive(Debug, Clone, Default)]
pub struct MediaTranslator {
    spotify: SpotifyConfig,
}

impl MediaTranslator {
    pub fn new(spotify: SpotifyConfig) -> Self {
        Self { spotify }
    }

    /// Maps a service URI to `(native_uri, metadata)`.
    ///
    /// # Errors
    /// `UnsupportedType` for a content type other than track, album, artist or
    /// playlist; `InvalidRequest` for a malformed identifier.
    pub fn translate(&self, service_uri: &str) -> ZoneResult<TranslatedMedia> {
        let parsed = ServiceUri::parse(service_uri)?;
        let canonical = format!("spotify:{}:{}", parsed.kind, parsed.id);
        let sid = self.spotify.service_id;
        let sn = self.spotify.serial_number;

        let uri = match parsed.kind {
            ContentKind::Track => {
                format!("x-sonos-spotify:{}?sid={}&flags=8224&sn={}", canonical, sid, sn)
            }
            kind => format!(
                "x-rincon-cpcontainer:{}{}?sid={}&flags=8300&sn={}",
                kind.item_prefix(),
                canonical,
                sid,
                sn
            ),
        };

        let item_id = format!("{}{}", parsed.kind.item_prefix(), canonical.replace(':', "%3a"));
        let descriptor = format!(
            "SA_RINCON{region}_X_#Svc{region}-0-Token",
            region = self.spotify.region
        );
        let metadata = format_didl_item(&DidlItem {
            item_id: &item_id,
            parent_id: "",
            title: "",
            class: parsed.kind.upnp_class(),
            descriptor: &descriptor,
        });

        Ok(TranslatedMedia {
            kind: Some(parsed.kind),
            uri,
            metadata,
        })
    }
}

/// Native URI and metadata of a TuneIn station.
pub fn tunein_station(station_id: &str) -> ZoneResult<TranslatedMedia> {
    let station = station_id.trim();
    if station.is_empty() || station.contains(['?', '&', ':']) {
        return Err(ZoneError::InvalidRequest(format!(
            "invalid TuneIn station id '{}'",
            station_id
        )));
    }

    let metadata = format_didl_item(&DidlItem {
        item_id: "R:0/0/0",
        parent_id: "R:0/0",
        title: "TuneIn",
        class: "object.item.audioItem.audioBroadcast",
        descriptor: TUNEIN_DESCRIPTOR,
    });

    Ok(TranslatedMedia {
        kind: None,
        uri: format!(
            "x-sonosapi-stream:{}?sid={}&flags=8224&sn=0",
            station, TUNEIN_SERVICE_ID
        ),
        metadata,
    })
}
