//! Live player directory backed by the speakers themselves.
//!
//! The only thing kept between calls is the list of known speaker addresses,
//! used to find a speaker to ask for the zone topology. Topology and player
//! state are read fresh on every call.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;

use crate::error::{SoapResult, ZoneError, ZoneResult};
use crate::sonos::traits::{PlayerDirectory, SonosDirectoryClient};
use crate::sonos::types::{
    PlayerHandle, PlayerId, PlayerSnapshot, ZoneGroup, ZoneGroupMember,
    ZoneSnapshot, ZoneTopologySnapshot,
};

/// `PlayerDirectory` that queries Sonos speakers over the network.
pub struct SonosDirectory {
    client: Arc<dyn SonosDirectoryClient>,
    known_addresses: RwLock<Vec<String>>,
    discovery_enabled: bool,
}

impl SonosDirectory {
    /// Creates a directory seeded with `seed_addresses`. When discovery is
    /// enabled and no address is known, SSDP runs on first use.
    pub fn new(
        client: Arc<dyn SonosDirectoryClient>,
        seed_addresses: Vec<String>,
        discovery_enabled: bool,
    ) -> Self {
        let mut known: Vec<String> = Vec::new();
        for addr in seed_addresses {
            let addr = addr.trim().to_string();
            if !addr.is_empty() && !known.contains(&addr) {
                known.push(addr);
            }
        }
        Self {
            client,
            known_addresses: RwLock::new(known),
            discovery_enabled,
        }
    }

    /// Addresses currently used to reach the household.
    pub fn known_addresses(&self) -> Vec<String> {
        self.known_addresses.read().clone()
    }

    fn remember<'a>(&self, addresses: impl IntoIterator<Item = &'a str>) {
        let mut known = self.known_addresses.write();
        for addr in addresses {
            if !known.iter().any(|k| k == addr) {
                log::debug!("[Sonos] Learned speaker address {}", addr);
                known.push(addr.to_string());
            }
        }
    }

    /// Known addresses, running discovery once if there are none yet.
    async fn addresses(&self) -> ZoneResult<Vec<String>> {
        let known = self.known_addresses();
        if !known.is_empty() {
            return Ok(known);
        }

        if self.discovery_enabled {
            match self.client.discover_speakers().await {
                Ok(found) => self.remember(found.iter().map(String::as_str)),
                Err(e) => log::warn!("[Sonos] Discovery failed: {}", e),
            }
        }

        let known = self.known_addresses();
        if known.is_empty() {
            return Err(ZoneError::DirectoryUnavailable(
                "no Sonos speakers have been discovered".into(),
            ));
        }
        Ok(known)
    }

    /// Reads the raw topology from the first known speaker that answers.
    async fn zone_groups(&self) -> ZoneResult<Vec<ZoneGroup>> {
        let mut last_error = None;

        for ip in self.addresses().await? {
            match self.client.get_zone_groups(&ip).await {
                Ok(groups) => {
                    self.remember(
                        groups
                            .iter()
                            .flat_map(|g| g.members.iter().map(|m| m.ip.as_str())),
                    );
                    return Ok(groups);
                }
                Err(e) => {
                    log::warn!("[Sonos] Topology read from {} failed: {}", ip, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ZoneError::DirectoryUnavailable(match last_error {
            Some(e) => format!("no known speaker answered: {}", e),
            None => "no known speaker answered".into(),
        }))
    }

    /// Reads one player's state. A failed read leaves its field `None` so a
    /// single unresponsive player does not hide the rest of the household.
    async fn read_player(&self, member: &ZoneGroupMember, coordinator_uuid: &str) -> PlayerSnapshot {
        let ip = member.ip.as_str();
        let (state, volume, muted) = tokio::join!(
            self.client.get_transport_state(ip),
            self.client.get_volume(ip),
            self.client.get_mute(ip),
        );
        let room = member.zone_name.as_str();

        PlayerSnapshot {
            id: PlayerId::new(member.uuid.clone()),
            room_name: member.zone_name.clone(),
            ip: member.ip.clone(),
            volume: read_or_none(volume, "Volume", room),
            muted: read_or_none(muted, "Mute", room),
            playback_state: read_or_none(state, "Transport", room),
            coordinator_id: PlayerId::new(coordinator_uuid),
        }
    }

    async fn read_zone(&self, group: &ZoneGroup) -> Option<ZoneSnapshot> {
        let Some(lead) = group.coordinator() else {
            log::warn!(
                "[Sonos] Zone group {} lists no coordinator among its members, skipping",
                group.id
            );
            return None;
        };
        let coordinator_ip = group.coordinator_ip.as_str();
        let players = join_all(
            group
                .members
                .iter()
                .map(|m| self.read_player(m, &group.coordinator_uuid)),
        );
        let (members, group_volume, group_muted, track_no) = tokio::join!(
            players,
            self.client.get_group_volume(coordinator_ip),
            self.client.get_group_mute(coordinator_ip),
            self.client.get_track_number(coordinator_ip),
        );

        let coordinator = members
            .iter()
            .find(|p| p.id.as_str() == group.coordinator_uuid)?
            .clone();
        let label = lead.zone_name.as_str();

        Some(ZoneSnapshot {
            id: group.id.clone(),
            group_volume: read_or_none(group_volume, "Group volume", label),
            group_muted: read_or_none(group_muted, "Group mute", label),
            track_no: read_or_none(track_no, "Position", label),
            coordinator,
            members,
        })
    }

    /// Finds `room` in a group that has a visible coordinator, preferring
    /// the coordinator itself for bonded rooms. Groups `read_zone` skips are
    /// skipped here too.
    fn find_member<'a>(groups: &'a [ZoneGroup], room: &str) -> Option<(&'a ZoneGroup, &'a ZoneGroupMember)> {
        groups
            .iter()
            .filter(|g| g.coordinator().is_some())
            .find_map(|g| {
                let mut in_room = g.members.iter().filter(|m| m.zone_name == room);
                let first = in_room.next()?;
                let preferred = std::iter::once(first)
                    .chain(in_room)
                    .find(|m| m.uuid == g.coordinator_uuid)
                    .unwrap_or(first);
                Some((g, preferred))
            })
    }
}

fn read_or_none<T>(value: SoapResult<T>, what: &str, room: &str) -> Option<T> {
    value
        .map_err(|e| log::warn!("[Sonos] {} read failed for {}: {}", what, room, e))
        .ok()
}

#[async_trait]
impl PlayerDirectory for SonosDirectory {
    async fn list_zones(&self) -> ZoneResult<ZoneTopologySnapshot> {
        let groups = self.zone_groups().await?;
        let zones = join_all(groups.iter().map(|g| self.read_zone(g))).await;
        Ok(ZoneTopologySnapshot::new(zones.into_iter().flatten().collect()))
    }

    async fn resolve(&self, room: &str) -> ZoneResult<PlayerHandle> {
        let groups = self.zone_groups().await?;
        Self::find_member(&groups, room)
            .map(|(_, member)| member.handle())
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    async fn resolve_coordinator(&self, room: &str) -> ZoneResult<PlayerHandle> {
        let groups = self.zone_groups().await?;
        Self::find_member(&groups, room)
            .and_then(|(group, _)| group.coordinator())
            .map(ZoneGroupMember::handle)
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    async fn any_player(&self) -> ZoneResult<PlayerHandle> {
        let groups = self.zone_groups().await?;
        groups
            .iter()
            .find_map(ZoneGroup::coordinator)
            .map(ZoneGroupMember::handle)
            .ok_or_else(|| ZoneError::DirectoryUnavailable("topology lists no players".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::error::DiscoveryResult;
    use crate::services::{PlaybackController, VolumeMode};
    use crate::sonos::soap::SoapError;
    use crate::sonos::traits::{CommandGateway, SonosDiscovery, SonosStatus, SonosTopology};
    use crate::sonos::types::{Command, PlaybackState};

    fn member(uuid: &str, ip: &str, room: &str) -> ZoneGroupMember {
        ZoneGroupMember {
            uuid: uuid.into(),
            ip: ip.into(),
            zone_name: room.into(),
        }
    }

    fn household() -> Vec<ZoneGroup> {
        vec![
            ZoneGroup {
                id: "RINCON_PORT:1".into(),
                coordinator_uuid: "RINCON_PORT".into(),
                coordinator_ip: "10.0.0.1".into(),
                members: vec![
                    member("RINCON_PORT", "10.0.0.1", "Port"),
                    member("RINCON_KITCHEN", "10.0.0.2", "Kitchen"),
                ],
            },
            ZoneGroup {
                id: "RINCON_OFFICE:1".into(),
                coordinator_uuid: "RINCON_OFFICE".into(),
                coordinator_ip: "10.0.0.3".into(),
                members: vec![member("RINCON_OFFICE", "10.0.0.3", "Office")],
            },
        ]
    }

    fn fault() -> SoapError {
        SoapError::Fault {
            code: Some(501),
            message: "Action Failed".into(),
        }
    }

    /// Speaker double answering from fixed state.
    struct FakeSpeakers {
        groups: Vec<ZoneGroup>,
        reachable: Vec<String>,
        discovered: Vec<String>,
        volumes: HashMap<String, u8>,
        broken_volume: Vec<String>,
        broken_mute: Vec<String>,
        broken_group_volume: Vec<String>,
        topology_calls: AtomicUsize,
        discovery_calls: AtomicUsize,
        sent: Mutex<Vec<(String, Command)>>,
    }

    impl FakeSpeakers {
        fn new(groups: Vec<ZoneGroup>) -> Self {
            Self {
                reachable: groups
                    .iter()
                    .flat_map(|g| g.members.iter().map(|m| m.ip.clone()))
                    .collect(),
                groups,
                discovered: Vec::new(),
                volumes: HashMap::from([("10.0.0.1".into(), 30), ("10.0.0.2".into(), 12)]),
                broken_volume: Vec::new(),
                broken_mute: Vec::new(),
                broken_group_volume: Vec::new(),
                topology_calls: AtomicUsize::new(0),
                discovery_calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SonosTopology for FakeSpeakers {
        async fn get_zone_groups(&self, ip: &str) -> SoapResult<Vec<ZoneGroup>> {
            self.topology_calls.fetch_add(1, Ordering::SeqCst);
            if self.reachable.iter().any(|r| r == ip) {
                Ok(self.groups.clone())
            } else {
                Err(SoapError::HttpStatus(503, "unreachable".into()))
            }
        }
    }

    #[async_trait]
    impl SonosStatus for FakeSpeakers {
        async fn get_transport_state(&self, ip: &str) -> SoapResult<PlaybackState> {
            Ok(if ip == "10.0.0.1" || ip == "10.0.0.2" {
                PlaybackState::Playing
            } else {
                PlaybackState::Stopped
            })
        }

        async fn get_volume(&self, ip: &str) -> SoapResult<u8> {
            if self.broken_volume.iter().any(|b| b == ip) {
                return Err(fault());
            }
            Ok(self.volumes.get(ip).copied().unwrap_or(5))
        }

        async fn get_mute(&self, ip: &str) -> SoapResult<bool> {
            if self.broken_mute.iter().any(|b| b == ip) {
                return Err(fault());
            }
            Ok(false)
        }

        async fn get_group_volume(&self, coordinator_ip: &str) -> SoapResult<u8> {
            if self.broken_group_volume.iter().any(|b| b == coordinator_ip) {
                return Err(fault());
            }
            Ok(if coordinator_ip == "10.0.0.1" { 21 } else { 5 })
        }

        async fn get_group_mute(&self, _coordinator_ip: &str) -> SoapResult<bool> {
            Ok(false)
        }

        async fn get_track_number(&self, _coordinator_ip: &str) -> SoapResult<u32> {
            Ok(4)
        }
    }

    #[async_trait]
    impl SonosDiscovery for FakeSpeakers {
        async fn discover_speakers(&self) -> DiscoveryResult<Vec<String>> {
            self.discovery_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.discovered.clone())
        }
    }

    #[async_trait]
    impl CommandGateway for FakeSpeakers {
        async fn send(&self, player: &PlayerHandle, command: Command) -> SoapResult<()> {
            self.sent.lock().push((player.room_name.clone(), command));
            Ok(())
        }
    }

    fn directory(fake: Arc<FakeSpeakers>, seeds: &[&str], discovery: bool) -> SonosDirectory {
        SonosDirectory::new(
            fake,
            seeds.iter().map(|s| s.to_string()).collect(),
            discovery,
        )
    }

    #[tokio::test]
    async fn list_zones_assembles_state() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(fake, &["10.0.0.1"], false);

        let snapshot = dir.list_zones().await.unwrap();
        assert_eq!(snapshot.zones.len(), 2);

        let port = snapshot.zone_led_by("Port").unwrap();
        assert_eq!(port.members.len(), 2);
        assert_eq!(port.group_volume, Some(21));
        assert_eq!(port.track_no, Some(4));
        assert_eq!(port.coordinator.volume, Some(30));
        assert_eq!(port.coordinator.playback_state, Some(PlaybackState::Playing));

        let kitchen = snapshot.player("Kitchen").unwrap();
        assert_eq!(kitchen.coordinator_id.as_str(), "RINCON_PORT");
        assert_ne!(kitchen.id, kitchen.coordinator_id);
    }

    #[tokio::test]
    async fn topology_addresses_are_remembered() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(fake, &["10.0.0.1"], false);

        dir.list_zones().await.unwrap();
        assert_eq!(dir.known_addresses(), vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[tokio::test]
    async fn failed_state_read_stays_unread() {
        let mut fake = FakeSpeakers::new(household());
        fake.broken_volume.push("10.0.0.2".into());
        fake.broken_group_volume.push("10.0.0.1".into());
        let dir = directory(Arc::new(fake), &["10.0.0.1"], false);

        let snapshot = dir.list_zones().await.unwrap();
        let kitchen = snapshot.player("Kitchen").unwrap();
        assert_eq!(kitchen.volume, None);
        assert_eq!(kitchen.muted, Some(false));

        let port = snapshot.zone_led_by("Port").unwrap();
        assert_eq!(port.group_volume, None);
        assert_eq!(port.coordinator.volume, Some(30));
        assert_eq!(snapshot.zone_led_by("Office").unwrap().group_volume, Some(5));
    }

    fn controller_over(fake: FakeSpeakers) -> (Arc<FakeSpeakers>, PlaybackController) {
        let fake = Arc::new(fake);
        let dir = Arc::new(directory(Arc::clone(&fake), &["10.0.0.1"], false));
        let controller = PlaybackController::new(dir, fake.clone());
        (fake, controller)
    }

    fn is_unread<T>(result: &ZoneResult<T>) -> bool {
        matches!(result, Err(ZoneError::DeviceError { code, .. }) if code == "state_unread")
    }

    #[tokio::test]
    async fn relative_group_volume_needs_a_read_group_volume() {
        let mut fake = FakeSpeakers::new(household());
        fake.broken_volume.push("10.0.0.1".into());
        fake.broken_group_volume.push("10.0.0.1".into());
        let (fake, controller) = controller_over(fake);

        let result = controller.zone_action("Port", 1, VolumeMode::Relative).await;
        assert!(is_unread(&result), "{:?}", result);
        assert!(fake.sent.lock().is_empty());

        controller.zone_action("Office", 1, VolumeMode::Relative).await.unwrap();
        assert_eq!(
            *fake.sent.lock(),
            vec![("Office".to_string(), Command::SetGroupVolume(6))]
        );
    }

    #[tokio::test]
    async fn player_volume_and_mute_toggles_need_their_reads() {
        let mut fake = FakeSpeakers::new(household());
        fake.broken_volume.push("10.0.0.2".into());
        fake.broken_mute.push("10.0.0.2".into());
        let (fake, controller) = controller_over(fake);

        assert!(is_unread(&controller.adjust_volume("Kitchen", 1).await));
        assert!(is_unread(&controller.toggle_mute("Kitchen").await));
        assert!(fake.sent.lock().is_empty());

        assert_eq!(controller.adjust_volume("Port", -2).await.unwrap(), 28);
    }

    #[tokio::test]
    async fn group_without_visible_coordinator_is_skipped_everywhere() {
        let mut groups = household();
        groups[1].coordinator_uuid = "RINCON_HIDDEN".into();
        let fake = Arc::new(FakeSpeakers::new(groups));
        let dir = directory(fake, &["10.0.0.1"], false);

        let snapshot = dir.list_zones().await.unwrap();
        assert_eq!(snapshot.zones.len(), 1);
        assert!(snapshot.player("Office").is_none());
        assert!(matches!(dir.resolve("Office").await, Err(ZoneError::NotFound(_))));
        assert!(matches!(
            dir.resolve_coordinator("Office").await,
            Err(ZoneError::NotFound(_))
        ));
        assert_eq!(dir.resolve("Kitchen").await.unwrap().ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn fails_over_to_next_known_speaker() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(Arc::clone(&fake), &["10.0.0.99", "10.0.0.3"], false);

        let handle = dir.resolve("Office").await.unwrap();
        assert_eq!(handle.ip, "10.0.0.3");
        assert_eq!(fake.topology_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_household_is_unavailable() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(fake, &["10.0.0.99"], false);

        let err = dir.list_zones().await.unwrap_err();
        assert!(matches!(err, ZoneError::DirectoryUnavailable(_)));
    }

    #[tokio::test]
    async fn no_speakers_without_discovery_is_unavailable() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(Arc::clone(&fake), &[], false);

        let err = dir.resolve("Port").await.unwrap_err();
        assert!(matches!(err, ZoneError::DirectoryUnavailable(_)));
        assert_eq!(fake.discovery_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discovery_runs_when_nothing_is_known() {
        let mut fake = FakeSpeakers::new(household());
        fake.discovered = vec!["10.0.0.3".into()];
        let fake = Arc::new(fake);
        let dir = directory(Arc::clone(&fake), &[], true);

        dir.resolve("Port").await.unwrap();
        dir.resolve("Port").await.unwrap();
        assert_eq!(fake.discovery_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolve_and_resolve_coordinator() {
        let fake = Arc::new(FakeSpeakers::new(household()));
        let dir = directory(fake, &["10.0.0.1"], false);

        assert_eq!(dir.resolve("Kitchen").await.unwrap().id.as_str(), "RINCON_KITCHEN");
        assert_eq!(
            dir.resolve_coordinator("Kitchen").await.unwrap().room_name,
            "Port"
        );
        assert!(matches!(
            dir.resolve("Garage").await,
            Err(ZoneError::NotFound(room)) if room == "Garage"
        ));
        assert!(matches!(
            dir.resolve_coordinator("Garage").await,
            Err(ZoneError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bonded_room_resolves_to_its_coordinator() {
        let groups = vec![ZoneGroup {
            id: "G".into(),
            coordinator_uuid: "RINCON_R".into(),
            coordinator_ip: "10.0.0.8".into(),
            members: vec![
                member("RINCON_L", "10.0.0.7", "Lounge"),
                member("RINCON_R", "10.0.0.8", "Lounge"),
            ],
        }];
        let fake = Arc::new(FakeSpeakers::new(groups));
        let dir = directory(fake, &["10.0.0.7"], false);

        assert_eq!(dir.resolve("Lounge").await.unwrap().ip, "10.0.0.8");
    }
}
