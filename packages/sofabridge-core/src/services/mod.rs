//! Application services layer.
//!
//! Business logic between the HTTP surface and the speaker seams in
//! `sonos/`. Every service takes its collaborators as trait objects.

pub mod library;
pub mod music;
pub mod playback;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod test_support;

pub use library::{LibraryService, QueueEntry, QueueListing, SpotifyAction};
pub use music::{MusicShortcuts, MusicStart, VolumeDirection};
pub use playback::{EqualizerSettings, PlaybackController, PlayerAction, RoomState, VolumeMode};
pub use reconciler::{
    plan, PlanStep, ReconcileCase, ReconcileOutcome, ReconcilePlan, ReconcileReport,
    ZoneReconciler,
};
