//! Favorites, saved playlists, the queue and music-service playback.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ZoneError, ZoneResult};
use crate::media::{tunein_station, MediaTranslator};
use crate::protocol_constants::{
    CONTAINER_URI_PREFIX, DEFAULT_QUEUE_LIMIT, RINCON_QUEUE_PREFIX, SAVED_QUEUE_URI_PREFIX,
};
use crate::sonos::traits::{CommandGateway, MediaLibrary, PlayerDirectory};
use crate::sonos::types::{BrowseContainer, Command, LibraryItem, PlayerHandle};

/// Where a Spotify item goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotifyAction {
    /// Replace the queue and start playing.
    Now,
    /// Insert after the current track.
    Next,
    /// Append to the queue.
    Queue,
}

impl FromStr for SpotifyAction {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "now" => Ok(Self::Now),
            "next" => Ok(Self::Next),
            "queue" => Ok(Self::Queue),
            _ => Err(ZoneError::InvalidRequest(format!(
                "unknown spotify action '{}'",
                s
            ))),
        }
    }
}

/// Queue entry without URI or metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_art_uri: Option<String>,
}

impl From<LibraryItem> for QueueEntry {
    fn from(item: LibraryItem) -> Self {
        Self {
            title: item.title,
            artist: item.artist,
            album: item.album,
            album_art_uri: item.album_art_uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueueListing {
    Summary(Vec<QueueEntry>),
    Detailed(Vec<LibraryItem>),
}

impl QueueListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Summary(entries) => entries.len(),
            Self::Detailed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn queue_uri(coordinator: &PlayerHandle) -> String {
    format!("{}{}#0", RINCON_QUEUE_PREFIX, coordinator.id)
}

/// Containers and saved queues have to be expanded into the queue; single
/// items and streams play directly from the transport.
fn needs_queue(uri: &str) -> bool {
    uri.starts_with(CONTAINER_URI_PREFIX) || uri.starts_with(SAVED_QUEUE_URI_PREFIX)
}

pub struct LibraryService {
    directory: Arc<dyn PlayerDirectory>,
    gateway: Arc<dyn CommandGateway>,
    library: Arc<dyn MediaLibrary>,
    translator: MediaTranslator,
}

impl LibraryService {
    pub fn new(
        directory: Arc<dyn PlayerDirectory>,
        gateway: Arc<dyn CommandGateway>,
        library: Arc<dyn MediaLibrary>,
        translator: MediaTranslator,
    ) -> Self {
        Self {
            directory,
            gateway,
            library,
            translator,
        }
    }

    async fn send(&self, player: &PlayerHandle, command: Command) -> ZoneResult<()> {
        log::debug!("[Library] {} -> {}", command.name(), player.room_name);
        self.gateway.send(player, command).await.map_err(|e| {
            let err = ZoneError::from(e);
            err.log("Library");
            err
        })
    }

    async fn browse(
        &self,
        player: &PlayerHandle,
        container: BrowseContainer,
        limit: u32,
    ) -> ZoneResult<Vec<LibraryItem>> {
        Ok(self.library.browse(player, container, limit).await?)
    }

    async fn find(
        &self,
        player: &PlayerHandle,
        container: BrowseContainer,
        title: &str,
    ) -> ZoneResult<LibraryItem> {
        self.browse(player, container, DEFAULT_QUEUE_LIMIT)
            .await?
            .into_iter()
            .find(|item| item.title.eq_ignore_ascii_case(title.trim()))
            .ok_or_else(|| ZoneError::NotFound(format!("'{}' in {}", title, container.object_id())))
    }

    /// Clears the queue, enqueues `uri`, points the transport at the queue
    /// and plays.
    async fn replace_queue_and_play(
        &self,
        coordinator: &PlayerHandle,
        uri: String,
        metadata: Option<String>,
    ) -> ZoneResult<()> {
        self.send(coordinator, Command::ClearQueue).await?;
        self.send(
            coordinator,
            Command::AddToQueue {
                uri,
                metadata,
                position: None,
                as_next: false,
            },
        )
        .await?;
        self.send(
            coordinator,
            Command::SetAvTransport {
                uri: queue_uri(coordinator),
                metadata: None,
            },
        )
        .await?;
        self.send(coordinator, Command::Play).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Favorites & Playlists
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn favorites(&self) -> ZoneResult<Vec<LibraryItem>> {
        let player = self.directory.any_player().await?;
        self.browse(&player, BrowseContainer::Favorites, DEFAULT_QUEUE_LIMIT)
            .await
    }

    pub async fn playlists(&self) -> ZoneResult<Vec<LibraryItem>> {
        let player = self.directory.any_player().await?;
        self.browse(&player, BrowseContainer::Playlists, DEFAULT_QUEUE_LIMIT)
            .await
    }

    /// Plays the favorite titled `name` (case-insensitive) on the room's zone.
    pub async fn play_favorite(&self, room: &str, name: &str) -> ZoneResult<LibraryItem> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let favorite = self
            .find(&coordinator, BrowseContainer::Favorites, name)
            .await?;
        log::info!("[Library] Playing favorite '{}' in {}", favorite.title, room);

        if needs_queue(&favorite.uri) {
            self.replace_queue_and_play(
                &coordinator,
                favorite.uri.clone(),
                favorite.metadata.clone(),
            )
            .await?;
        } else {
            self.send(
                &coordinator,
                Command::SetAvTransport {
                    uri: favorite.uri.clone(),
                    metadata: favorite.metadata.clone(),
                },
            )
            .await?;
            self.send(&coordinator, Command::Play).await?;
        }
        Ok(favorite)
    }

    /// Replaces the room's queue with the saved playlist titled `name`.
    pub async fn play_playlist(&self, room: &str, name: &str) -> ZoneResult<LibraryItem> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let playlist = self
            .find(&coordinator, BrowseContainer::Playlists, name)
            .await?;
        log::info!("[Library] Playing playlist '{}' in {}", playlist.title, room);

        self.replace_queue_and_play(&coordinator, playlist.uri.clone(), playlist.metadata.clone())
            .await?;
        Ok(playlist)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queue
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn clear_queue(&self, room: &str) -> ZoneResult<()> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        self.send(&coordinator, Command::ClearQueue).await
    }

    pub async fn queue(&self, room: &str, detailed: bool, limit: u32) -> ZoneResult<QueueListing> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let items = self
            .browse(&coordinator, BrowseContainer::Queue, limit)
            .await?;
        Ok(if detailed {
            QueueListing::Detailed(items)
        } else {
            QueueListing::Summary(items.into_iter().map(QueueEntry::from).collect())
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Music Services
    // ─────────────────────────────────────────────────────────────────────────

    /// Plays or enqueues a Spotify item on the room's zone. Returns the
    /// native URI that was enqueued.
    pub async fn spotify(
        &self,
        room: &str,
        action: SpotifyAction,
        service_uri: &str,
    ) -> ZoneResult<String> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let media = self.translator.translate(service_uri)?;
        log::info!("[Library] Spotify {:?} in {}: {}", action, room, service_uri);

        match action {
            SpotifyAction::Now => {
                self.replace_queue_and_play(
                    &coordinator,
                    media.uri.clone(),
                    Some(media.metadata),
                )
                .await?;
            }
            SpotifyAction::Next => {
                let snapshot = self.directory.list_zones().await?;
                let track_no = snapshot
                    .zone_of(room)
                    .ok_or_else(|| ZoneError::NotFound(room.to_string()))?
                    .track_no
                    .ok_or_else(|| ZoneError::state_unread("track number", room))?;
                self.send(
                    &coordinator,
                    Command::AddToQueue {
                        uri: media.uri.clone(),
                        metadata: Some(media.metadata),
                        position: Some(track_no + 1),
                        as_next: true,
                    },
                )
                .await?;
            }
            SpotifyAction::Queue => {
                self.send(
                    &coordinator,
                    Command::AddToQueue {
                        uri: media.uri.clone(),
                        metadata: Some(media.metadata),
                        position: None,
                        as_next: false,
                    },
                )
                .await?;
            }
        }
        Ok(media.uri)
    }

    /// Tunes the room's zone to a TuneIn station. The transport is set but
    /// not started.
    pub async fn tunein(&self, room: &str, station_id: &str) -> ZoneResult<String> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let media = tunein_station(station_id)?;
        log::info!("[Library] TuneIn station {} in {}", station_id, room);
        self.send(
            &coordinator,
            Command::SetAvTransport {
                uri: media.uri.clone(),
                metadata: Some(media.metadata),
            },
        )
        .await?;
        Ok(media.uri)
    }

    /// Starts a rescan of the music library shares.
    pub async fn reindex(&self) -> ZoneResult<()> {
        let player = self.directory.any_player().await?;
        self.send(&player, Command::RefreshShareIndex).await
    }
}
