//! One-button shortcuts for the remote front-end, all acting on the
//! configured default zone.

use std::iter;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ZoneError, ZoneResult};
use crate::services::library::LibraryService;
use crate::services::playback::{PlaybackController, PlayerAction, VolumeMode};
use crate::services::reconciler::{ReconcileOutcome, ZoneReconciler};
use crate::sonos::traits::PlayerDirectory;
use crate::sonos::types::{DesiredGrouping, RoomName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

impl FromStr for VolumeDirection {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ZoneError::InvalidRequest(format!(
                "unknown volume direction '{}'",
                s
            ))),
        }
    }
}

/// What `start_music` did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicStart {
    pub favorite: String,
    pub coordinator: RoomName,
    pub rooms: Vec<RoomName>,
    /// Joins left for a later pass because the zone already existed.
    pub deferred_joins: Vec<RoomName>,
}

pub struct MusicShortcuts {
    directory: Arc<dyn PlayerDirectory>,
    reconciler: Arc<ZoneReconciler>,
    playback: Arc<PlaybackController>,
    library: Arc<LibraryService>,
    default_zone: RoomName,
    step_up: i32,
    step_down: i32,
}

impl MusicShortcuts {
    pub fn new(
        directory: Arc<dyn PlayerDirectory>,
        reconciler: Arc<ZoneReconciler>,
        playback: Arc<PlaybackController>,
        library: Arc<LibraryService>,
        default_zone: impl Into<RoomName>,
        step_up: i32,
        step_down: i32,
    ) -> Self {
        Self {
            directory,
            reconciler,
            playback,
            library,
            default_zone: default_zone.into(),
            step_up,
            step_down,
        }
    }

    pub fn default_zone(&self) -> &str {
        &self.default_zone
    }

    /// Groups every room under the default zone and plays the favorite named
    /// by `playlist` (underscores stand for spaces).
    pub async fn start_music(&self, playlist: &str) -> ZoneResult<MusicStart> {
        let favorite = playlist.replace('_', " ");
        let rooms = self.directory.list_zones().await?.room_names();
        let desired = DesiredGrouping::new(
            self.default_zone.clone(),
            iter::once(self.default_zone.clone()).chain(rooms),
        );
        log::info!(
            "[Music] Starting '{}' on {} ({} room(s))",
            favorite,
            self.default_zone,
            desired.member_rooms.len()
        );

        let deferred_joins = match self.reconciler.reconcile(&desired).await? {
            ReconcileOutcome::Applied(report) => report.deferred_joins,
            ReconcileOutcome::NotApplicable => Vec::new(),
        };
        let item = self
            .library
            .play_favorite(&self.default_zone, &favorite)
            .await?;

        Ok(MusicStart {
            favorite: item.title,
            coordinator: self.default_zone.clone(),
            rooms: desired.member_rooms,
            deferred_joins,
        })
    }

    /// `play`, `pause` or `playpause` on the default zone.
    pub async fn music_action(&self, action: &str) -> ZoneResult<Option<bool>> {
        let action: PlayerAction = action.parse()?;
        self.playback
            .player_action(&self.default_zone, action)
            .await
    }

    /// Shifts the default zone's group volume by the configured step.
    pub async fn volume_step(&self, direction: VolumeDirection) -> ZoneResult<i32> {
        let delta = match direction {
            VolumeDirection::Up => self.step_up,
            VolumeDirection::Down => -self.step_down,
        };
        self.playback
            .zone_action(&self.default_zone, delta, VolumeMode::Relative)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaTranslator;
    use crate::services::test_support::{item, zone, FakeHousehold};

    fn shortcuts(household: &Arc<FakeHousehold>) -> MusicShortcuts {
        let reconciler = Arc::new(ZoneReconciler::new(household.clone(), household.clone()));
        let playback = Arc::new(PlaybackController::new(household.clone(), household.clone()));
        let library = Arc::new(LibraryService::new(
            household.clone(),
            household.clone(),
            household.clone(),
            MediaTranslator::default(),
        ));
        MusicShortcuts::new(household.clone(), reconciler, playback, library, "Port", 1, 2)
    }

    #[tokio::test]
    async fn start_music_groups_everything_then_plays_favorite() {
        let household = Arc::new(
            FakeHousehold::new(vec![zone("Kitchen", &["Port"]), zone("Office", &[])])
                .with_favorites(vec![item("Friday Night", "x-sonosapi-stream:s1")]),
        );
        let started = shortcuts(&household)
            .start_music("friday_night")
            .await
            .unwrap();

        assert_eq!(started.favorite, "Friday Night");
        assert_eq!(started.rooms, vec!["Port", "Kitchen", "Office"]);
        let sent = household.sent_names();
        assert_eq!(sent[0], "Port:Leave");
        assert_eq!(sent[1..3].to_vec(), vec!["Kitchen:Join", "Office:Join"]);
        assert_eq!(
            sent[sent.len() - 2..].to_vec(),
            vec!["Port:SetAvTransport", "Port:Play"]
        );
    }

    #[tokio::test]
    async fn start_music_with_unknown_favorite_still_groups() {
        let household = Arc::new(FakeHousehold::new(vec![zone("Port", &[]), zone("Office", &[])]));
        let err = shortcuts(&household).start_music("nope").await.unwrap_err();

        assert!(matches!(err, ZoneError::NotFound(_)));
        assert!(household.sent_names().contains(&"Port:SetVolume".to_string()));
    }

    #[tokio::test]
    async fn volume_steps_use_configured_sizes() {
        let household = Arc::new(FakeHousehold::new(vec![zone("Port", &[])]));
        let s = shortcuts(&household);

        assert_eq!(s.volume_step(VolumeDirection::Up).await.unwrap(), 21);
        assert_eq!(s.volume_step(VolumeDirection::Down).await.unwrap(), 19);
        assert!("sideways".parse::<VolumeDirection>().is_err());
    }

    #[tokio::test]
    async fn music_action_targets_default_zone() {
        let household = Arc::new(FakeHousehold::new(vec![zone("Port", &["Kitchen"])]));
        let s = shortcuts(&household);

        assert_eq!(s.music_action("playpause").await.unwrap(), Some(false));
        assert_eq!(household.sent_names(), vec!["Port:Play"]);
        assert!(matches!(
            s.music_action("rewind").await,
            Err(ZoneError::InvalidRequest(_))
        ));
    }
}
