//! In-memory household shared by the service tests.
//!
//! `FakeHousehold` implements all three collaborator seams over one mutable
//! snapshot, records every command it receives, and applies the state effect
//! of the commands the services read back (grouping, transport, volume, mute).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{SoapResult, ZoneError, ZoneResult};
use crate::sonos::soap::SoapError;
use crate::sonos::traits::{CommandGateway, MediaLibrary, PlayerDirectory};
use crate::sonos::types::{
    BrowseContainer, Command, LibraryItem, PlaybackState, PlayerHandle, PlayerId, PlayerSnapshot,
    ZoneSnapshot, ZoneTopologySnapshot,
};

pub(crate) fn player_id(room: &str) -> PlayerId {
    PlayerId::new(format!("RINCON_{}", room.to_uppercase().replace(' ', "_")))
}

pub(crate) fn ip_of(room: &str) -> String {
    format!("{}.lan", room.to_lowercase().replace(' ', "-"))
}

fn player(room: &str, coordinator: &str) -> PlayerSnapshot {
    PlayerSnapshot {
        id: player_id(room),
        room_name: room.to_string(),
        ip: ip_of(room),
        volume: Some(20),
        muted: Some(false),
        playback_state: Some(PlaybackState::Stopped),
        coordinator_id: player_id(coordinator),
    }
}

/// A zone led by `coordinator` with `others` following it.
pub(crate) fn zone(coordinator: &str, others: &[&str]) -> ZoneSnapshot {
    let lead = player(coordinator, coordinator);
    let mut members = vec![lead.clone()];
    members.extend(others.iter().map(|room| player(room, coordinator)));
    ZoneSnapshot {
        id: format!("{}:1", player_id(coordinator)),
        coordinator: lead,
        members,
        group_volume: Some(20),
        group_muted: Some(false),
        track_no: Some(0),
    }
}

pub(crate) fn item(title: &str, uri: &str) -> LibraryItem {
    LibraryItem {
        title: title.to_string(),
        uri: uri.to_string(),
        metadata: Some(format!("<DIDL-Lite>{}</DIDL-Lite>", title)),
        ..Default::default()
    }
}

#[derive(Default)]
pub(crate) struct FakeHousehold {
    snapshot: Mutex<ZoneTopologySnapshot>,
    sent: Mutex<Vec<(String, Command)>>,
    failure: Mutex<Option<(String, &'static str)>>,
    favorites: Mutex<Vec<LibraryItem>>,
    playlists: Mutex<Vec<LibraryItem>>,
    queue: Mutex<Vec<LibraryItem>>,
    unavailable: AtomicBool,
    list_calls: AtomicUsize,
}

impl FakeHousehold {
    pub fn new(zones: Vec<ZoneSnapshot>) -> Self {
        Self {
            snapshot: Mutex::new(ZoneTopologySnapshot::new(zones)),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        let household = Self::default();
        household.unavailable.store(true, Ordering::SeqCst);
        household
    }

    pub fn with_favorites(self, items: Vec<LibraryItem>) -> Self {
        *self.favorites.lock() = items;
        self
    }

    pub fn with_playlists(self, items: Vec<LibraryItem>) -> Self {
        *self.playlists.lock() = items;
        self
    }

    pub fn with_queue(self, items: Vec<LibraryItem>) -> Self {
        *self.queue.lock() = items;
        self
    }

    /// Makes every `command` sent to `room` fail with a UPnP fault.
    pub fn fail_on(&self, room: &str, command: &'static str) {
        *self.failure.lock() = Some((room.to_string(), command));
    }

    pub fn edit(&self, f: impl FnOnce(&mut ZoneTopologySnapshot)) {
        f(&mut self.snapshot.lock());
    }

    pub fn snapshot(&self) -> ZoneTopologySnapshot {
        self.snapshot.lock().clone()
    }

    pub fn sent(&self) -> Vec<(String, Command)> {
        self.sent.lock().clone()
    }

    /// Commands rendered as `"Room:Name"` for compact assertions.
    pub fn sent_names(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|(room, cmd)| format!("{}:{}", room, cmd.name()))
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Removes a player from its zone, promoting the next member when the
    /// coordinator leaves. Empty zones disappear.
    fn detach(snapshot: &mut ZoneTopologySnapshot, target: &PlayerId) -> Option<PlayerSnapshot> {
        let index = snapshot
            .zones
            .iter()
            .position(|z| z.members.iter().any(|m| m.id == *target))?;
        let zone = &mut snapshot.zones[index];
        let position = zone.members.iter().position(|m| m.id == *target)?;
        let player = zone.members.remove(position);

        if zone.members.is_empty() {
            snapshot.zones.remove(index);
        } else if zone.coordinator.id == *target {
            let lead = zone.members[0].id.clone();
            for member in zone.members.iter_mut() {
                member.coordinator_id = lead.clone();
            }
            zone.coordinator = zone.members[0].clone();
        }
        Some(player)
    }

    fn regroup(snapshot: &mut ZoneTopologySnapshot, target: &PlayerId, command: &Command) {
        let Some(mut player) = Self::detach(snapshot, target) else {
            return;
        };
        let host = match command {
            Command::Join(coordinator_id) => snapshot
                .zones
                .iter_mut()
                .find(|z| z.coordinator.id == *coordinator_id),
            _ => None,
        };
        match host {
            Some(zone) => {
                player.coordinator_id = zone.coordinator.id.clone();
                zone.members.push(player);
            }
            None => {
                player.coordinator_id = player.id.clone();
                snapshot.zones.push(ZoneSnapshot {
                    id: format!("{}:2", player.id),
                    coordinator: player.clone(),
                    members: vec![player],
                    group_volume: Some(20),
                    group_muted: Some(false),
                    track_no: Some(0),
                });
            }
        }
    }

    fn apply(&self, target: &PlayerId, command: &Command) {
        let mut snapshot = self.snapshot.lock();
        if matches!(command, Command::Join(_) | Command::Leave) {
            Self::regroup(&mut snapshot, target, command);
            return;
        }
        for zone in snapshot.zones.iter_mut() {
            let leads = zone.coordinator.id == *target;
            match command {
                Command::Play | Command::Pause if leads => {
                    let state = if matches!(command, Command::Play) {
                        PlaybackState::Playing
                    } else {
                        PlaybackState::PausedPlayback
                    };
                    zone.coordinator.playback_state = Some(state);
                }
                Command::SetGroupVolume(v) if leads => {
                    zone.group_volume = Some((*v).clamp(0, 100) as u8);
                }
                Command::SetGroupMute(m) if leads => zone.group_muted = Some(*m),
                _ => {}
            }
            for member in zone.members.iter_mut().filter(|m| m.id == *target) {
                match command {
                    Command::SetVolume(v) => member.volume = Some((*v).clamp(0, 100) as u8),
                    Command::Mute => member.muted = Some(true),
                    Command::Unmute => member.muted = Some(false),
                    _ => {}
                }
            }
            let coordinator_id = zone.coordinator.id.clone();
            if let Some(copy) = zone.members.iter().find(|m| m.id == coordinator_id).cloned() {
                zone.coordinator.volume = copy.volume;
                zone.coordinator.muted = copy.muted;
            }
        }
    }
}

#[async_trait]
impl PlayerDirectory for FakeHousehold {
    async fn list_zones(&self) -> ZoneResult<ZoneTopologySnapshot> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ZoneError::DirectoryUnavailable("no speakers known".into()));
        }
        Ok(self.snapshot())
    }
}

#[async_trait]
impl CommandGateway for FakeHousehold {
    async fn send(&self, player: &PlayerHandle, command: Command) -> SoapResult<()> {
        let failing = self
            .failure
            .lock()
            .as_ref()
            .is_some_and(|(room, name)| *room == player.room_name && *name == command.name());
        if failing {
            return Err(SoapError::Fault {
                code: Some(701),
                message: "Transition not available".into(),
            });
        }

        self.apply(&player.id, &command);
        self.sent.lock().push((player.room_name.clone(), command));
        Ok(())
    }
}

#[async_trait]
impl MediaLibrary for FakeHousehold {
    async fn browse(
        &self,
        _player: &PlayerHandle,
        container: BrowseContainer,
        limit: u32,
    ) -> SoapResult<Vec<LibraryItem>> {
        let items = match container {
            BrowseContainer::Favorites => self.favorites.lock().clone(),
            BrowseContainer::Playlists => self.playlists.lock().clone(),
            BrowseContainer::Queue => self.queue.lock().clone(),
        };
        Ok(items.into_iter().take(limit as usize).collect())
    }
}
