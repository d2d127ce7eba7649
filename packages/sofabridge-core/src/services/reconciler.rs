//! Zone topology reconciliation.
//!
//! Converges the live grouping of a household toward a [`DesiredGrouping`]:
//! - the plan is computed from one fresh snapshot by a pure function
//! - steps are applied strictly in order, first failure aborts the rest
//! - nothing is rolled back; a failed pass may leave the household partially
//!   regrouped, and the next pass starts from whatever it then observes

use std::sync::Arc;

use serde::Serialize;

use crate::error::{ZoneError, ZoneResult};
use crate::protocol_constants::BASELINE_GROUP_VOLUME;
use crate::sonos::traits::{CommandGateway, PlayerDirectory};
use crate::sonos::types::{Command, DesiredGrouping, RoomName, ZoneTopologySnapshot};

/// Which reconciliation path a plan took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileCase {
    /// The coordinator room already heads a zone: only surplus members leave.
    ExistingZone,
    /// The coordinator room heads no zone: it leaves, then the others join it.
    NewZone,
}

/// One device operation of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PlanStep {
    Leave {
        room: RoomName,
    },
    #[serde(rename_all = "camelCase")]
    Join {
        room: RoomName,
        coordinator_room: RoomName,
    },
    SetVolume {
        room: RoomName,
        volume: i32,
    },
}

impl PlanStep {
    pub fn room(&self) -> &str {
        match self {
            Self::Leave { room } | Self::Join { room, .. } | Self::SetVolume { room, .. } => room,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub case: ReconcileCase,
    pub steps: Vec<PlanStep>,
    /// Rooms that should join an existing zone but are left for a later pass.
    pub deferred_joins: Vec<RoomName>,
}

/// Result of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub coordinator: RoomName,
    pub case: ReconcileCase,
    pub steps: Vec<PlanStep>,
    pub deferred_joins: Vec<RoomName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// One room or none requested; nothing was read or sent.
    NotApplicable,
    Applied(ReconcileReport),
}

/// Computes the steps that move `snapshot` toward `desired`.
pub fn plan(snapshot: &ZoneTopologySnapshot, desired: &DesiredGrouping) -> ReconcilePlan {
    let coordinator = desired.coordinator_room.as_str();
    let mut steps = Vec::new();
    let mut deferred_joins = Vec::new();

    let case = match snapshot.zone_led_by(coordinator) {
        Some(zone) => {
            let current = zone.room_names();
            for room in current.iter().filter(|r| **r != coordinator) {
                if !desired.contains(room) {
                    steps.push(PlanStep::Leave {
                        room: room.to_string(),
                    });
                }
            }
            deferred_joins.extend(
                desired
                    .member_rooms
                    .iter()
                    .filter(|r| r.as_str() != coordinator && !current.contains(&r.as_str()))
                    .cloned(),
            );
            ReconcileCase::ExistingZone
        }
        None => {
            steps.push(PlanStep::Leave {
                room: coordinator.to_string(),
            });
            for room in desired.member_rooms.iter().filter(|r| r.as_str() != coordinator) {
                steps.push(PlanStep::Join {
                    room: room.clone(),
                    coordinator_room: coordinator.to_string(),
                });
            }
            ReconcileCase::NewZone
        }
    };

    steps.extend(desired.member_rooms.iter().map(|room| PlanStep::SetVolume {
        room: room.clone(),
        volume: BASELINE_GROUP_VOLUME,
    }));

    ReconcilePlan {
        case,
        steps,
        deferred_joins,
    }
}

/// Applies grouping changes through injected collaborators.
pub struct ZoneReconciler {
    directory: Arc<dyn PlayerDirectory>,
    gateway: Arc<dyn CommandGateway>,
}

impl ZoneReconciler {
    pub fn new(directory: Arc<dyn PlayerDirectory>, gateway: Arc<dyn CommandGateway>) -> Self {
        Self { directory, gateway }
    }

    /// Reads a fresh snapshot, plans, and applies the plan fail-fast.
    pub async fn reconcile(&self, desired: &DesiredGrouping) -> ZoneResult<ReconcileOutcome> {
        if !desired.is_applicable() {
            log::debug!(
                "[Reconcile] {} requested with {} room(s), nothing to do",
                desired.coordinator_room,
                desired.member_rooms.len()
            );
            return Ok(ReconcileOutcome::NotApplicable);
        }

        let snapshot = self.directory.list_zones().await?;
        let plan = plan(&snapshot, desired);
        log::info!(
            "[Reconcile] {} ({:?}): {} step(s), {} deferred join(s)",
            desired.coordinator_room,
            plan.case,
            plan.steps.len(),
            plan.deferred_joins.len()
        );

        for step in &plan.steps {
            if let Err(e) = self.apply(&snapshot, step).await {
                e.log("Reconcile");
                return Err(e);
            }
        }

        Ok(ReconcileOutcome::Applied(ReconcileReport {
            coordinator: desired.coordinator_room.clone(),
            case: plan.case,
            steps: plan.steps,
            deferred_joins: plan.deferred_joins,
        }))
    }

    /// Handles come from the pass's snapshot; identifiers and addresses do
    /// not change when a player leaves or joins.
    async fn apply(&self, snapshot: &ZoneTopologySnapshot, step: &PlanStep) -> ZoneResult<()> {
        let command = match step {
            PlanStep::Leave { .. } => Command::Leave,
            PlanStep::Join {
                coordinator_room, ..
            } => {
                let coordinator = snapshot
                    .player(coordinator_room)
                    .ok_or_else(|| ZoneError::NotFound(coordinator_room.clone()))?;
                Command::Join(coordinator.id.clone())
            }
            PlanStep::SetVolume { volume, .. } => Command::SetVolume(*volume),
        };

        let player = snapshot
            .player(step.room())
            .ok_or_else(|| ZoneError::NotFound(step.room().to_string()))?
            .handle();
        log::debug!("[Reconcile] {} -> {}", command.name(), player.room_name);
        self.gateway.send(&player, command).await?;
        Ok(())
    }

    /// Makes `room` follow the coordinator of `coordinator_room`.
    pub async fn join(&self, room: &str, coordinator_room: &str) -> ZoneResult<()> {
        let player = self.directory.resolve(room).await?;
        let coordinator = self.directory.resolve(coordinator_room).await?;
        log::info!("[Reconcile] {} joins {}", room, coordinator_room);
        self.gateway
            .send(&player, Command::Join(coordinator.id))
            .await?;
        Ok(())
    }

    /// Makes `room` a standalone zone.
    pub async fn leave(&self, room: &str) -> ZoneResult<()> {
        let player = self.directory.resolve(room).await?;
        log::info!("[Reconcile] {} leaves its group", room);
        self.gateway.send(&player, Command::Leave).await?;
        Ok(())
    }
}
